//! Example schema: one nested record, a tagged variant, and an enum.
//! This file is input to noserde-gen, not compiled directly.

use noserde;

noserde::scalar_enum! {
    pub enum Kind: u8 {
        Int = 0,
        Real = 1,
    }
}

#[noserde]
struct Inner {
    score: i16,
    enabled: bool,
}

#[noserde]
struct Example {
    flag: bool,
    id: i32,
    inner: Inner,
    value: variant<i32, f64>,
    kind: Kind,
}
