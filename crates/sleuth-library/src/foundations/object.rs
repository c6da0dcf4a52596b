use std::cell::RefCell;
use std::fmt::{self, Debug, Formatter};
use std::rc::Rc;

use ecow::EcoString;
use indexmap::IndexMap;

use crate::foundations::{Func, Value};

/// The host classes the trace layer distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostClass {
    /// A DOM element.
    Element,
    /// The `style` declaration of an element.
    CssStyleDeclaration,
    /// The `classList` of an element.
    DomTokenList,
    /// An attribute node with an `ownerElement`.
    Attr,
    /// A jQuery-wrapped element set.
    JQuery,
    /// A regular expression value.
    RegExp,
}

/// A shared, mutable object.
///
/// Handles are cheap to clone and compare by pointer identity. The
/// interpreter and the evaluated program both write through the same handle;
/// there is no copy-on-write.
#[derive(Clone, Default)]
pub struct Object(Rc<RefCell<Repr>>);

#[derive(Default)]
struct Repr {
    /// The host class, if the object models a host type.
    class: Option<HostClass>,
    /// Named properties, in insertion order.
    props: IndexMap<EcoString, Value>,
    /// Dense storage; present only for arrays and array-likes.
    items: Option<Vec<Value>>,
    /// The compiled pattern of a `RegExp`-class object.
    regex: Option<regex::Regex>,
    /// The constructor that produced the object, for `instanceof`.
    construct: Option<Func>,
}

impl Object {
    /// Create a plain object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an array with the given items.
    pub fn array(items: Vec<Value>) -> Self {
        let object = Self::new();
        object.0.borrow_mut().items = Some(items);
        object
    }

    /// Create an object modeling a host type.
    pub fn of_class(class: HostClass) -> Self {
        let object = Self::new();
        object.0.borrow_mut().class = Some(class);
        object
    }

    /// Create an array-backed object modeling a host type.
    pub fn array_of_class(class: HostClass, items: Vec<Value>) -> Self {
        let object = Self::of_class(class);
        object.0.borrow_mut().items = Some(items);
        object
    }

    /// The object's host class.
    pub fn class(&self) -> Option<HostClass> {
        self.0.borrow().class
    }

    /// Whether the object models the given host class.
    pub fn is(&self, class: HostClass) -> bool {
        self.class() == Some(class)
    }

    /// Whether the object carries dense array storage.
    pub fn is_array(&self) -> bool {
        self.0.borrow().items.is_some()
    }

    /// Read a property. Arrays answer `length` and numeric indices; anything
    /// absent reads as `undefined`.
    pub fn get(&self, key: &str) -> Value {
        let repr = self.0.borrow();
        if let Some(items) = &repr.items {
            if key == "length" {
                return Value::Num(items.len() as f64);
            }
            if let Ok(index) = key.parse::<usize>() {
                return items.get(index).cloned().unwrap_or_default();
            }
        }
        repr.props.get(key).cloned().unwrap_or_default()
    }

    /// Write a property. Assigning an array's `length` resizes it; writing
    /// past the end fills the gap with `undefined`.
    pub fn set(&self, key: impl Into<EcoString>, value: Value) {
        let key = key.into();
        let mut repr = self.0.borrow_mut();
        if let Some(items) = &mut repr.items {
            if key == "length" {
                let len = super::ops::to_number(&value).max(0.0) as usize;
                items.resize(len, Value::Undefined);
                return;
            }
            if let Ok(index) = key.parse::<usize>() {
                if index >= items.len() {
                    items.resize(index + 1, Value::Undefined);
                }
                items[index] = value;
                return;
            }
        }
        repr.props.insert(key, value);
    }

    /// Remove a property. Deleting an array slot leaves a hole, not a
    /// shorter array.
    pub fn delete(&self, key: &str) -> bool {
        let mut repr = self.0.borrow_mut();
        if let Some(items) = &mut repr.items
            && let Ok(index) = key.parse::<usize>()
        {
            if index < items.len() {
                items[index] = Value::Undefined;
            }
            return true;
        }
        repr.props.shift_remove(key);
        true
    }

    /// Whether the object has the property.
    pub fn has(&self, key: &str) -> bool {
        let repr = self.0.borrow();
        if let Some(items) = &repr.items {
            if key == "length" {
                return true;
            }
            if let Ok(index) = key.parse::<usize>() {
                return index < items.len();
            }
        }
        repr.props.contains_key(key)
    }

    /// The enumerable keys, in the order `for-in` visits them: array indices
    /// first, then named properties in insertion order.
    pub fn keys(&self) -> Vec<EcoString> {
        let repr = self.0.borrow();
        let mut keys = Vec::new();
        if let Some(items) = &repr.items {
            keys.extend((0..items.len()).map(|i| ecow::eco_format!("{i}")));
        }
        keys.extend(repr.props.keys().cloned());
        keys
    }

    /// The dense items of an array-backed object.
    pub fn items(&self) -> Option<Vec<Value>> {
        self.0.borrow().items.clone()
    }

    /// Append to the dense storage of an array-backed object.
    pub fn push(&self, value: Value) {
        if let Some(items) = &mut self.0.borrow_mut().items {
            items.push(value);
        }
    }

    /// Remove all dense items equal to the given value.
    pub fn retain_items(&self, f: impl Fn(&Value) -> bool) {
        if let Some(items) = &mut self.0.borrow_mut().items {
            items.retain(|item| f(item));
        }
    }

    /// Attach a compiled pattern to a `RegExp`-class object.
    pub fn set_regex(&self, regex: regex::Regex) {
        self.0.borrow_mut().regex = Some(regex);
    }

    /// Run the compiled pattern against a haystack. `None` when the pattern
    /// did not translate to the host regex engine.
    pub fn regex_is_match(&self, haystack: &str) -> Option<bool> {
        self.0.borrow().regex.as_ref().map(|regex| regex.is_match(haystack))
    }

    /// Record the constructor that produced this object.
    pub fn set_construct(&self, func: Func) {
        self.0.borrow_mut().construct = Some(func);
    }

    /// The constructor that produced this object.
    pub fn construct(&self) -> Option<Func> {
        self.0.borrow().construct.clone()
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Debug for Object {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        // Objects can be cyclic (`parent` links, `ownerElement`), so never
        // recurse into property values here.
        let repr = self.0.borrow();
        write!(f, "Object(")?;
        match repr.class {
            Some(class) => write!(f, "{class:?}")?,
            None if repr.items.is_some() => write!(f, "Array")?,
            None => write!(f, "plain")?,
        }
        if let Some(items) = &repr.items {
            write!(f, ", {} items", items.len())?;
        }
        write!(f, ", {} props)", repr.props.len())
    }
}
