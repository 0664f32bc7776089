// (c) Copyright 2025 Helsing GmbH. All rights reserved.
#![cfg_attr(not(target_os = "linux"), allow(dead_code, unused_imports))]

use iai_callgrind::{library_benchmark, library_benchmark_group, main};
use local_undo::{
    ChangeLog,
    commute::commute_content,
    model::{DocChange, DocumentGraph, NodeId},
    repair::repair,
};
use std::hint::black_box;

mod common;

type Fixture = (DocumentGraph, ChangeLog<DocChange>, NodeId);

#[library_benchmark]
#[bench::short(common::foreign_tail(255, 16))]
#[bench::long(common::foreign_tail(255, 1024))]
fn commute_foreign_tail((_, log, _): Fixture) {
    let log = black_box(log);
    let mut own = log.all_changes()[0].clone();
    black_box(commute_content(&mut own, log.all_changes(), 1));
}

#[library_benchmark]
#[bench::short(common::foreign_tail(255, 16))]
#[bench::long(common::foreign_tail(255, 1024))]
fn undo_own_point((mut doc, mut log, _): Fixture) {
    let inverses = log.undo_own_point(black_box(&mut doc));
    black_box(inverses);
}

#[library_benchmark]
#[bench::medium(common::long_body(255))]
fn repair_clean_body((mut doc, body): (DocumentGraph, NodeId)) {
    let report = repair(black_box(&mut doc), [body]);
    black_box(report);
}

library_benchmark_group!(
    name = undo;
    benchmarks = commute_foreign_tail, undo_own_point
);

library_benchmark_group!(
    name = structure;
    benchmarks = repair_clean_body
);

#[cfg(target_os = "linux")]
main!(library_benchmark_groups = undo, structure);

#[cfg(not(target_os = "linux"))]
fn main() {}
