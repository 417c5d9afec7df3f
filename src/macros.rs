/// Builds a `Vec<Value>` from a list of expressions.
///
/// Each element goes through `Value::from`, so integers, floats, `bool`,
/// `char` and strings can be mixed freely.
///
/// ```rust
/// use pubpack::{values, Value};
///
/// let list = values![1, 2.5, "hi"];
/// assert_eq!(list.len(), 3);
/// assert_eq!(list[2], Value::Symbol("hi".to_string()));
/// ```
#[macro_export]
macro_rules! values {
    // Handle empty list
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };

    ($($elem:expr),+ $(,)?) => {
        vec![$($crate::Value::from($elem)),+]
    };
}
