// (c) Copyright 2025 Helsing GmbH. All rights reserved.
/// Convenience macro for creating a list of [`SimpleAction`](crate::SimpleAction)s.
///
/// `+ index => payload` is an insertion, `- index => payload` a removal.
///
/// ```rust
/// # use local_undo::{actions, SimpleAction};
/// let typed_then_fixed = actions![+ 0 => 'a', + 1 => 'c', - 1 => 'c', + 1 => 'b'];
/// assert_eq!(typed_then_fixed[2], SimpleAction::remove(1, 'c'));
/// ```
///
/// NOTE! Indices are not checked against each other, the list is taken as is.
#[macro_export]
macro_rules! actions {
    (@one + $index:expr, $payload:expr) => {
        $crate::SimpleAction::insert($index, $payload)
    };
    (@one - $index:expr, $payload:expr) => {
        $crate::SimpleAction::remove($index, $payload)
    };
    ($($sign:tt $index:expr => $payload:expr),* $(,)?) => {
        vec![$($crate::actions!(@one $sign $index, $payload)),*]
    };
}
