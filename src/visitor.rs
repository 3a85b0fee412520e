//! Exhaustive dispatch over the closed set of leaf kinds.
//!
//! Anything that needs to branch on what a [`Leaf`] holds goes through this
//! module: either implement [`LeafVisitor`] (one required method per kind, no
//! fallback) or hand [`apply`] one closure per kind. Forgetting a kind is a
//! compile error in both forms.
//!
//! ```
//! use conftree::{Leaf, visitor};
//!
//! let leaf = Leaf::Int(42);
//! let doubled = visitor::apply(
//!     &leaf,
//!     |s| s.len() as i64,
//!     |i| i * 2,
//!     |f| (f * 2.0) as i64,
//!     |b| b as i64,
//! );
//! assert_eq!(doubled, 84);
//! ```

use std::marker::PhantomData;

use crate::tree::Leaf;

/// A handler for every leaf kind, producing `Self::Output`.
///
/// Visitors are consumed by [`Leaf::accept`]; implement the trait for
/// `&mut T` when the visitor should be reused.
pub trait LeafVisitor {
    type Output;

    fn visit_text(self, value: &str) -> Self::Output;
    fn visit_int(self, value: i64) -> Self::Output;
    fn visit_float(self, value: f64) -> Self::Output;
    fn visit_bool(self, value: bool) -> Self::Output;
}

impl Leaf {
    /// Run the handler matching the stored kind.
    pub fn accept<V: LeafVisitor>(&self, visitor: V) -> V::Output {
        match self {
            Leaf::Text(v) => visitor.visit_text(v),
            Leaf::Int(v) => visitor.visit_int(*v),
            Leaf::Float(v) => visitor.visit_float(*v),
            Leaf::Bool(v) => visitor.visit_bool(*v),
        }
    }
}

/// Apply one closure per leaf kind and return whichever result matches.
pub fn apply<R, T, I, F, B>(leaf: &Leaf, on_text: T, on_int: I, on_float: F, on_bool: B) -> R
where
    T: FnOnce(&str) -> R,
    I: FnOnce(i64) -> R,
    F: FnOnce(f64) -> R,
    B: FnOnce(bool) -> R,
{
    leaf.accept(Handlers {
        on_text,
        on_int,
        on_float,
        on_bool,
        _output: PhantomData,
    })
}

struct Handlers<R, T, I, F, B> {
    on_text: T,
    on_int: I,
    on_float: F,
    on_bool: B,
    _output: PhantomData<fn() -> R>,
}

impl<R, T, I, F, B> LeafVisitor for Handlers<R, T, I, F, B>
where
    T: FnOnce(&str) -> R,
    I: FnOnce(i64) -> R,
    F: FnOnce(f64) -> R,
    B: FnOnce(bool) -> R,
{
    type Output = R;

    fn visit_text(self, value: &str) -> R {
        (self.on_text)(value)
    }

    fn visit_int(self, value: i64) -> R {
        (self.on_int)(value)
    }

    fn visit_float(self, value: f64) -> R {
        (self.on_float)(value)
    }

    fn visit_bool(self, value: bool) -> R {
        (self.on_bool)(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(leaf: &Leaf) -> &'static str {
        apply(leaf, |_| "text", |_| "int", |_| "float", |_| "bool")
    }

    #[test]
    fn apply_picks_handler_for_each_kind() {
        assert_eq!(tag(&Leaf::Text("x".into())), "text");
        assert_eq!(tag(&Leaf::Int(1)), "int");
        assert_eq!(tag(&Leaf::Float(1.0)), "float");
        assert_eq!(tag(&Leaf::Bool(false)), "bool");
    }

    #[test]
    fn apply_passes_stored_value() {
        let render = |leaf: &Leaf| {
            apply(
                leaf,
                |s| format!("s:{s}"),
                |i| format!("i:{i}"),
                |f| format!("f:{f}"),
                |b| format!("b:{b}"),
            )
        };
        assert_eq!(render(&Leaf::Text("host".into())), "s:host");
        assert_eq!(render(&Leaf::Int(-7)), "i:-7");
        assert_eq!(render(&Leaf::Float(2.5)), "f:2.5");
        assert_eq!(render(&Leaf::Bool(true)), "b:true");
    }

    #[test]
    fn closures_may_capture_by_move() {
        let owned = String::from("captured");
        let out = apply(
            &Leaf::Bool(true),
            |_| String::new(),
            |_| String::new(),
            |_| String::new(),
            move |_| owned,
        );
        assert_eq!(out, "captured");
    }

    struct CountingVisitor {
        texts: usize,
        numbers: usize,
        bools: usize,
    }

    impl LeafVisitor for &mut CountingVisitor {
        type Output = ();

        fn visit_text(self, _: &str) {
            self.texts += 1;
        }

        fn visit_int(self, _: i64) {
            self.numbers += 1;
        }

        fn visit_float(self, _: f64) {
            self.numbers += 1;
        }

        fn visit_bool(self, _: bool) {
            self.bools += 1;
        }
    }

    #[test]
    fn reusable_visitor_through_mut_ref() {
        let leaves = [
            Leaf::Text("a".into()),
            Leaf::Int(1),
            Leaf::Float(0.5),
            Leaf::Bool(true),
            Leaf::Text("b".into()),
        ];
        let mut counter = CountingVisitor {
            texts: 0,
            numbers: 0,
            bools: 0,
        };
        for leaf in &leaves {
            leaf.accept(&mut counter);
        }
        assert_eq!(counter.texts, 2);
        assert_eq!(counter.numbers, 2);
        assert_eq!(counter.bools, 1);
    }
}
