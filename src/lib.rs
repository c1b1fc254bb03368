//! Fab Quote - configuration-driven quotation engine for metal fabrication
//!
//! A product family is an ordered list of declarations loaded from a
//! tabular source. Evaluating it against user input yields a unit price and
//! an advisory bill of materials; priced items collect in a [`quote::Quote`]
//! and are folded into a [`quote::Quotation`].

pub mod bom;
pub mod core;
pub mod engine;
pub mod expression;
pub mod quote;
pub mod schema;
