// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Implementation of the quickcheck::Arbitrary trait for log and model types.
use crate::{
    OwnRange, SimpleAction, UndoConfig,
    model::{Item, NodeId, PropValue, Property},
};
use quickcheck::{Arbitrary, Gen};

/// Index into a short collection. Most interesting behavior occurs when indices collide.
fn small_index(g: &mut Gen) -> usize {
    usize::from(u8::arbitrary(g) % 8)
}

impl<T: Arbitrary> Arbitrary for SimpleAction<T> {
    fn arbitrary(g: &mut Gen) -> Self {
        Self {
            is_insertion: bool::arbitrary(g),
            index: small_index(g),
            payload: T::arbitrary(g),
        }
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        let is_insertion = self.is_insertion;
        let payload = self.payload.clone();
        Box::new(self.index.shrink().map(move |index| Self {
            is_insertion,
            index,
            payload: payload.clone(),
        }))
    }
}

impl Arbitrary for OwnRange {
    fn arbitrary(g: &mut Gen) -> Self {
        Self::new(small_index(g), small_index(g) + 1)
    }
}

impl Arbitrary for UndoConfig {
    fn arbitrary(g: &mut Gen) -> Self {
        UndoConfig::default()
            .with_max_own_ranges(small_index(g))
            .with_repair(bool::arbitrary(g))
    }
}

impl Arbitrary for NodeId {
    fn arbitrary(g: &mut Gen) -> Self {
        // skewed towards few distinct nodes so that edits meet on the same collection
        let choices = [1, 1, 1, 2, 2, 3, u32::arbitrary(g) % 64];
        NodeId(*g.choose(&choices).unwrap_or(&1))
    }
}

impl Arbitrary for Item {
    fn arbitrary(g: &mut Gen) -> Self {
        match u8::arbitrary(g) % 8 {
            0 => Item::Node(NodeId::arbitrary(g)),
            1 => Item::Ref(NodeId::arbitrary(g)),
            2 => Item::ParaEnd,
            _ => Item::Text(char::from(b'a' + u8::arbitrary(g) % 26)),
        }
    }
}

impl Arbitrary for Property {
    fn arbitrary(g: &mut Gen) -> Self {
        *g.choose(&[
            Property::Bold,
            Property::FontSize,
            Property::Layout,
            Property::Anchor,
        ])
        .unwrap_or(&Property::Bold)
    }
}

impl Arbitrary for PropValue {
    fn arbitrary(g: &mut Gen) -> Self {
        match u8::arbitrary(g) % 3 {
            0 => PropValue::Bool(bool::arbitrary(g)),
            1 => PropValue::Int(i64::from(u8::arbitrary(g))),
            _ => PropValue::Ref(NodeId::arbitrary(g)),
        }
    }
}
