use std::sync::{Arc, Mutex};

use crate::counter::Counter;
use crate::*;

fn logging_destroyer<T: std::fmt::Debug + ?Sized + 'static>(log: &Arc<Mutex<Vec<String>>>) -> Destroyer<T>
{
    let log = log.clone();
    Function::new(move |ptr: Option<Box<T>>| {
        log.lock().unwrap().push(format!("{:?}", ptr));
    })
}

fn entries(log: &Arc<Mutex<Vec<String>>>) -> Vec<String> { log.lock().unwrap().clone() }

#[test]
fn user_story()
{
    let log = Arc::new(Mutex::new(Vec::new()));

    let x = SharedPtr::with_destroyer(Box::new(2i32), logging_destroyer(&log));
    let y = x.downgrade();

    let z = y.lock();
    assert_eq!(z.get(), Some(&2));
    assert_eq!(x.use_count(), 2);

    std::mem::drop(x);
    assert!(!y.expired());
    assert_eq!(z.use_count(), 1);

    std::mem::drop(z);
    assert!(y.expired());
    assert!(y.lock().is_null());
    assert_eq!(entries(&log), vec!["Some(2)".to_string()]);
}

#[test]
fn function_calls_through()
{
    let mut double: Function<(i32,), i32> = Function::new(|x: i32| x * 2);
    assert_eq!(double.call((21,)), Ok(42));

    let mut join: Function<(&'static str, &'static str), String> =
        Function::new(|a: &'static str, b: &'static str| format!("{}{}", a, b));
    assert_eq!(join.call(("foo", "bar")), Ok("foobar".to_string()));

    let mut constant: Function<(), u8> = Function::new(|| 7u8);
    assert_eq!(constant.call(()), Ok(7));
}

fn add_one(x: u64) -> u64 { x + 1 }

#[test]
fn function_wraps_fn_items()
{
    let mut f: Function<(u64,), u64> = Function::new(add_one);
    assert_eq!(f.call((1,)), Ok(2));
}

#[test]
fn empty_function_fails()
{
    let mut f = Function::<(i32,), i32>::default();
    assert!(f.is_empty());
    assert_eq!(f.call((1,)), Err(Error::EmptyCallable));
}

#[test]
fn function_clone_is_deep()
{
    let mut counter = 0;
    let mut a: Function<(), i32> = Function::new(move || {
        counter += 1;
        counter
    });
    assert_eq!(a.call(()), Ok(1));

    let mut b = a.clone();
    assert_eq!(b.call(()), Ok(2));
    assert_eq!(b.call(()), Ok(3));
    assert_eq!(a.call(()), Ok(2));
}

#[test]
fn function_take_leaves_empty()
{
    let mut a: Function<(), i32> = Function::new(|| 5);
    let mut b = a.take();
    assert!(a.is_empty());
    assert_eq!(b.call(()), Ok(5));

    a.swap(&mut b);
    assert!(b.is_empty());
    assert_eq!(a.call(()), Ok(5));
}

#[test]
#[should_panic(expected = "boom")]
fn function_panics_propagate()
{
    let mut f: Function<(), ()> = Function::new(|| panic!("boom"));
    let _ = f.call(());
}

#[test]
fn unique_runs_destroyer_once()
{
    let log = Arc::new(Mutex::new(Vec::new()));
    {
        let p = UniquePtr::with_destroyer(Box::new("a"), logging_destroyer(&log));
        assert_eq!(p.get(), Some(&"a"));
        let moved = p;
        assert!(!moved.is_null());
    }
    assert_eq!(entries(&log), vec!["Some(\"a\")".to_string()]);
}

#[test]
fn unique_null_still_calls_destroyer()
{
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut p = UniquePtr::<i32>::null();
    p.set_destroyer(logging_destroyer(&log));
    drop(p);
    assert_eq!(entries(&log), vec!["None".to_string()]);
}

#[test]
fn unique_reset_destroys_previous()
{
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut p = UniquePtr::with_destroyer(Box::new(1), logging_destroyer(&log));
    p.reset(Some(Box::new(2)), logging_destroyer(&log));
    assert_eq!(entries(&log), vec!["Some(1)".to_string()]);
    assert_eq!(p.get(), Some(&2));

    *p.get_mut().unwrap() = 3;
    drop(p);
    assert_eq!(entries(&log), vec!["Some(1)".to_string(), "Some(3)".to_string()]);
}

#[test]
fn unique_release_skips_destroyer()
{
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut p = UniquePtr::with_destroyer(Box::new(9), logging_destroyer(&log));
    assert_eq!(p.release(), Some(Box::new(9)));
    drop(p);
    assert_eq!(entries(&log), vec!["None".to_string()]);
}

#[test]
fn unique_swap_and_compare()
{
    let mut a = make_unique(1);
    let mut b = make_unique(2);
    let addr_a = a.get().map(|r| r as *const i32);

    a.swap(&mut b);
    assert_eq!(a.get(), Some(&2));
    assert_eq!(b.get().map(|r| r as *const i32), addr_a);
    assert!(a != b);
    assert_eq!(UniquePtr::<i32>::null(), UniquePtr::<i32>::default());
}

#[test]
fn unique_zero_sized_pointees_stay_distinct()
{
    let a = make_unique(());
    let b = make_unique(());
    assert!(a != b);
    assert!(PartialEq::eq(&a, &a));
    assert!(a != UniquePtr::null());
    assert!(UniquePtr::<()>::null() == UniquePtr::null());

    let empty = UniquePtr::<[u8]>::from_box(Box::new([0u8; 0]));
    assert!(empty != UniquePtr::<[u8]>::from_box(Box::new([0u8; 0])));
}

#[test]
fn unique_empty_destroyer_falls_back_to_drop()
{
    let flag = Arc::new(());
    let p = UniquePtr::with_destroyer(Box::new(flag.clone()), Function::default());
    assert_eq!(Arc::strong_count(&flag), 2);
    drop(p);
    assert_eq!(Arc::strong_count(&flag), 1);
}

#[test]
fn shared_counts_clones()
{
    let a = make_shared(String::from("x"));
    assert_eq!(a.use_count(), 1);

    let b = a.clone();
    assert_eq!(a.use_count(), 2);
    assert!(a.ptr_eq(&b));
    assert_eq!(a, b);

    drop(b);
    assert_eq!(a.use_count(), 1);
    assert_eq!(SharedPtr::<String>::null().use_count(), 0);
}

#[test]
fn shared_destroyer_runs_once()
{
    let log = Arc::new(Mutex::new(Vec::new()));
    let a = SharedPtr::with_destroyer(Box::new(7u8), logging_destroyer(&log));
    let b = a.clone();
    let c = b.clone();
    let d = c.clone();
    assert_eq!(d.use_count(), 4);

    drop(a);
    drop(c);
    drop(b);
    assert!(entries(&log).is_empty());
    drop(d);
    assert_eq!(entries(&log), vec!["Some(7)".to_string()]);
}

#[test]
fn shared_move_keeps_destroyer()
{
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut a = SharedPtr::with_destroyer(Box::new(1), logging_destroyer(&log));
    let mut b = SharedPtr::null();
    b.swap(&mut a);
    assert!(a.is_null());
    assert_eq!(b.use_count(), 1);

    drop(a);
    assert!(entries(&log).is_empty());
    let c = b;
    drop(c);
    assert_eq!(entries(&log), vec!["Some(1)".to_string()]);
}

#[test]
fn shared_reset()
{
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut a = SharedPtr::with_destroyer(Box::new(1), logging_destroyer(&log));
    let b = a.clone();

    a.reset(Some(Box::new(2)), logging_destroyer(&log));
    assert!(entries(&log).is_empty());
    assert_eq!(a.get(), Some(&2));
    assert_eq!(a.use_count(), 1);
    assert_eq!(b.use_count(), 1);

    drop(b);
    assert_eq!(entries(&log), vec!["Some(1)".to_string()]);

    a.reset(None, pointers::default_destroyer());
    assert!(a.is_null());
    assert_eq!(entries(&log), vec!["Some(1)".to_string(), "Some(2)".to_string()]);
}

trait Shape
{
    fn name(&self) -> &'static str;
}

struct Square;
struct Circle;

impl Shape for Square
{
    fn name(&self) -> &'static str { "square" }
}

impl Shape for Circle
{
    fn name(&self) -> &'static str { "circle" }
}

#[test]
fn pointers_hold_trait_objects()
{
    let shapes: Vec<SharedPtr<dyn Shape>> = vec![
        SharedPtr::from_box(Box::new(Square) as Box<dyn Shape>),
        SharedPtr::from_box(Box::new(Circle) as Box<dyn Shape>),
    ];
    let names: Vec<_> = shapes.iter().filter_map(|s| s.get()).map(|s| s.name()).collect();
    assert_eq!(names, ["square", "circle"]);

    let weak = shapes[1].downgrade();
    assert_eq!(weak.lock().get().map(|s| s.name()), Some("circle"));

    let unique: UniquePtr<dyn Shape> = UniquePtr::from_box(Box::new(Square) as Box<dyn Shape>);
    assert_eq!(unique.get().map(|s| s.name()), Some("square"));
}

#[test]
fn weak_does_not_keep_alive()
{
    let a = make_shared(5);
    let w = make_weak(&a);
    let w2 = w.clone();
    assert_eq!(a.use_count(), 1);
    assert_eq!(a.weak_count(), 2);
    assert_eq!(w, w2);

    drop(a);
    assert!(w.expired());
    assert!(w2.lock().is_null());
    assert_eq!(w.use_count(), 0);
}

#[test]
fn weak_lock_keeps_alive()
{
    let a = make_shared(vec![1, 2, 3]);
    let w = WeakPtr::from(&a);
    let locked = w.lock();
    drop(a);
    assert!(!w.expired());
    assert_eq!(locked.get(), Some(&vec![1, 2, 3]));
}

#[test]
fn default_weak_is_expired()
{
    let w = WeakPtr::<i32>::default();
    assert!(w.expired());
    assert!(w.lock().is_null());
    assert_eq!(SharedPtr::<i32>::null().downgrade(), w);
}

#[test]
fn counter_refuses_resurrection()
{
    let c = Counter::new();
    assert!(c.try_increment());
    assert_eq!(c.strong(), 2);
    assert!(!c.decrement());
    assert!(c.decrement());
    assert!(c.is_dead());
    assert!(!c.try_increment());
    assert_eq!(c.strong(), 0);
}

#[test]
fn any_round_trip()
{
    let mut value = Any::new(42i32);
    assert!(value.has_value());
    assert!(value.is::<i32>());
    assert_eq!(value.cast::<i32>(), Ok(&mut 42));
    assert_eq!(
        value.cast::<f64>(),
        Err(Error::TypeMismatch {
            expected: "f64",
            found: "i32"
        })
    );
}

#[test]
fn any_cast_mutates_in_place()
{
    let mut value = Any::new(String::from("hello"));
    value.cast::<String>().unwrap().push_str(", world");
    assert_eq!(value.cast_ref::<String>().map(String::as_str), Ok("hello, world"));
}

#[test]
fn any_clone_preserves_value()
{
    let original = Any::new(vec![1u8, 2, 3]);
    let mut copy = original.clone();
    copy.cast::<Vec<u8>>().unwrap().push(4);

    assert_eq!(original.cast_ref::<Vec<u8>>(), Ok(&vec![1, 2, 3]));
    assert_eq!(copy.cast_ref::<Vec<u8>>(), Ok(&vec![1, 2, 3, 4]));
}

#[test]
fn any_clone_from_replaces()
{
    let source = Any::new(1.5f64);
    let mut target = Any::new("old");
    target.clone_from(&source);
    assert_eq!(target.cast_ref::<f64>(), Ok(&1.5));
    assert!(target.cast_ref::<&str>().is_err());

    let snapshot = target.clone();
    target.clone_from(&snapshot);
    assert_eq!(target.cast_ref::<f64>(), Ok(&1.5));
}

#[derive(Debug)]
struct FailsToClone;

impl Clone for FailsToClone
{
    fn clone(&self) -> Self { panic!("clone failed") }
}

#[test]
fn any_clone_from_survives_failed_copy()
{
    let source = Any::new(FailsToClone);
    let mut target = Any::new(5i32);

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| target.clone_from(&source)));
    assert!(result.is_err());
    assert_eq!(target.type_name(), Some("i32"));
    assert_eq!(target.cast_ref::<i32>(), Ok(&5));
    assert!(source.is::<FailsToClone>());
}

#[test]
fn empty_any()
{
    let mut value = Any::default();
    assert!(!value.has_value());
    assert_eq!(value.type_name(), None);
    assert_eq!(value.cast::<i32>(), Err(Error::EmptyValue { expected: "i32" }));
    assert!(!value.clone().has_value());

    value.set(3u16);
    assert_eq!(value.type_name(), Some("u16"));
    value.reset();
    assert!(!value.has_value());
}

#[test]
fn any_take()
{
    let mut value = Any::new(String::from("owned"));
    assert!(value.take::<i32>().is_err());
    assert!(value.has_value());
    assert_eq!(value.take::<String>(), Ok(String::from("owned")));
    assert!(!value.has_value());
    assert_eq!(value.take::<String>(), Err(Error::EmptyValue { expected: "alloc::string::String" }));
}

#[test]
fn any_drops_its_value()
{
    let flag = Arc::new(());
    let value = Any::new(flag.clone());
    let copy = value.clone();
    assert_eq!(Arc::strong_count(&flag), 3);
    drop(value);
    drop(copy);
    assert_eq!(Arc::strong_count(&flag), 1);
}

#[test]
fn error_messages()
{
    assert_eq!(Error::EmptyCallable.to_string(), "called a Function that holds no callable");
    assert_eq!(
        Error::TypeMismatch {
            expected: "f64",
            found: "i32"
        }
        .to_string(),
        "type mismatch: expected `f64`, found `i32`"
    );
}
