//! Property-based invariant tests for buffered cells and path cells.
//!
//! 1. Buffering isolation: writes without commit/revert never reach the
//!    wrapped cell.
//! 2. Commit writes the last buffered value and always ends unbuffered.
//! 3. Revert restores the wrapped value, including after external writes.
//! 4. Buffering-state events alternate and match `is_buffering`.
//! 5. Path cells are cached by canonical path.

use std::cell::RefCell;
use std::rc::Rc;

use bindery_core::access::PropertyAccessStrategy;
use bindery_core::buffer::BufferedValueCell;
use bindery_core::domain::Bean;
use bindery_core::reactive::{ValueCell, ValueCellExt, ValueHolder};
use bindery_core::value::Value;
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        (-50i64..50).prop_map(Value::from),
        "[a-c]{0,3}".prop_map(Value::from),
    ]
}

#[derive(Debug, Clone)]
enum Op {
    Set(Value),
    External(Value),
    Commit,
    Revert,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => value_strategy().prop_map(Op::Set),
        2 => value_strategy().prop_map(Op::External),
        1 => Just(Op::Commit),
        1 => Just(Op::Revert),
    ]
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Buffering isolation
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn buffered_writes_never_reach_wrapped(
        initial in value_strategy(),
        writes in proptest::collection::vec(value_strategy(), 1..20),
    ) {
        let holder = Rc::new(ValueHolder::new(initial.clone()));
        let buffer = BufferedValueCell::new(holder.clone(), None);
        for value in writes {
            buffer.set_value(value).unwrap();
            prop_assert_eq!(holder.get(), initial.clone());
        }
        prop_assert_eq!(holder.version(), 0);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Commit writes the last buffered value
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn commit_writes_last_buffered_value(
        initial in value_strategy(),
        writes in proptest::collection::vec(value_strategy(), 1..10),
    ) {
        let holder = Rc::new(ValueHolder::new(initial.clone()));
        let buffer = BufferedValueCell::new(holder.clone(), None);
        for value in &writes {
            buffer.set_value(value.clone()).unwrap();
        }
        let visible = buffer.get_value().unwrap();
        buffer.commit().unwrap();

        prop_assert!(!buffer.is_buffering());
        prop_assert_eq!(holder.get(), visible.clone());
        prop_assert_eq!(buffer.get_value().unwrap(), visible);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Revert restores truth
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn revert_restores_wrapped_value(
        initial in value_strategy(),
        ops in proptest::collection::vec(op_strategy(), 1..30),
    ) {
        let holder = Rc::new(ValueHolder::new(initial));
        let buffer = BufferedValueCell::new(holder.clone(), None);
        for op in ops {
            match op {
                Op::Set(v) => buffer.set_value(v).unwrap(),
                Op::External(v) => holder.set(v),
                Op::Commit => buffer.commit().unwrap(),
                Op::Revert => buffer.revert(),
            }
            if !buffer.is_buffering() {
                prop_assert_eq!(buffer.get_value().unwrap(), holder.get());
            }
        }
        buffer.revert();
        prop_assert!(!buffer.is_buffering());
        prop_assert_eq!(buffer.get_value().unwrap(), holder.get());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Buffering-state events alternate
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn buffering_events_alternate(
        ops in proptest::collection::vec(op_strategy(), 1..30),
    ) {
        let holder = Rc::new(ValueHolder::new(Value::Null));
        let buffer = BufferedValueCell::new(holder.clone(), None);
        let events = Rc::new(RefCell::new(Vec::new()));
        let events_clone = Rc::clone(&events);
        let _sub = buffer.subscribe_buffering(move |b| events_clone.borrow_mut().push(b));

        for op in ops {
            let before = events.borrow().len();
            let was = buffer.is_buffering();
            match op {
                Op::Set(v) => buffer.set_value(v).unwrap(),
                Op::External(v) => holder.set(v),
                Op::Commit => buffer.commit().unwrap(),
                Op::Revert => buffer.revert(),
            }
            let now = buffer.is_buffering();
            let fired = events.borrow().len() - before;
            prop_assert_eq!(fired, usize::from(was != now));
            if fired == 1 {
                prop_assert_eq!(events.borrow().last().copied(), Some(now));
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Path cells are cached by canonical path
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn equivalent_key_spellings_share_a_cell(key in "[a-z][a-z0-9_]{0,6}") {
        let bean = Bean::builder("Bean")
            .property("m", Value::map([(key.clone(), 1)]))
            .build();
        let strategy = PropertyAccessStrategy::new(bean);
        let bare = strategy.get_value_cell(&format!("m[{key}]")).unwrap();
        let single = strategy.get_value_cell(&format!("m['{key}']")).unwrap();
        let double = strategy.get_value_cell(&format!("m[\"{key}\"]")).unwrap();
        prop_assert!(Rc::ptr_eq(&bare, &single));
        prop_assert!(Rc::ptr_eq(&bare, &double));
        prop_assert_eq!(bare.get_value().unwrap(), Value::from(1));
    }
}
