// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use local_undo::{
    SimpleAction,
    commute::{commute_content, transform},
    model::DocChange,
    repair::repair,
};
use std::hint::black_box;
use tango_bench::{IntoBenchmarks, benchmark_fn, tango_benchmarks, tango_main};

mod common;

fn commute_benchmarks() -> impl IntoBenchmarks {
    let (_, log, _) = common::foreign_tail(255, 1024);
    let log: &'static _ = Box::leak(Box::new(log));
    [
        benchmark_fn("commute::pair", move |b| {
            b.iter(move || {
                let mut own = black_box(SimpleAction::insert(7, 'o'));
                let mut later = black_box(SimpleAction::remove(3, 'f'));
                transform(&mut own, &mut later)
            })
        }),
        benchmark_fn("commute::foreign_tail", move |b| {
            b.iter(move || {
                let log = black_box(&*log);
                let mut own = log.all_changes()[0].clone();
                commute_content(&mut own, log.all_changes(), 1)
            })
        }),
    ]
}

fn undo_benchmarks() -> impl IntoBenchmarks {
    let fixture = common::foreign_tail(255, 1024);
    let fixture: &'static _ = Box::leak(Box::new(fixture));
    [benchmark_fn("undo::own_point", move |b| {
        b.iter(move || {
            let (doc, log, _) = black_box(fixture);
            let mut doc = doc.clone();
            let mut log = log.clone();
            log.undo_own_point(&mut doc)
        })
    })]
}

fn repair_benchmarks() -> impl IntoBenchmarks {
    let fixture = common::long_body(255);
    let fixture: &'static _ = Box::leak(Box::new(fixture));
    [
        benchmark_fn("repair::clean_body", move |b| {
            b.iter(move || {
                let (doc, body) = black_box(fixture);
                let mut doc = doc.clone();
                repair(&mut doc, [*body])
            })
        }),
        benchmark_fn("repair::emptied_body", move |b| {
            b.iter(move || {
                let (doc, body) = black_box(fixture);
                let mut doc = doc.clone();
                for index in (0..doc.content(*body).len()).rev() {
                    let item = doc.content(*body)[index];
                    doc.apply(&DocChange::remove(*body, index, item));
                }
                repair(&mut doc, [*body])
            })
        }),
    ]
}

tango_benchmarks!(commute_benchmarks(), undo_benchmarks(), repair_benchmarks());
tango_main!();
