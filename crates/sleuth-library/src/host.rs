//! Synthetic browser doubles.
//!
//! A real deployment runs scripts against a live page; tests and the CLI run
//! them against these stand-ins instead. The doubles model exactly the API
//! surface the reference checker classifies: elements with `style`,
//! `classList` and attributes, attribute nodes, and jQuery-wrapped sets.

use ecow::{EcoString, eco_format};

use crate::checker::{CheckSite, Checker, SiteCallee, Status};
use crate::foundations::{Func, HostClass, Object, Value, ops};

/// Build a browser-like host context.
///
/// The context carries a `document` with `createElement`/`getElementById`,
/// a `window` self-reference, the host constructors needed for `instanceof`
/// checks, and a minimal jQuery.
pub fn browser() -> Object {
    let context = Object::new();

    let document = Object::new();
    document.set("all", Value::Object(Object::array(vec![])));
    document.set(
        "createElement",
        Value::Func(Func::native("createElement", 1, None, |this, args| {
            let document = this_object(this)?;
            let tag = ops::to_string(&arg(args, 0));
            let created = element(&tag);
            if let Value::Object(all) = document.get("all") {
                all.push(Value::Object(created.clone()));
            }
            Ok(Value::Object(created))
        })),
    );
    document.set(
        "getElementById",
        Value::Func(Func::native("getElementById", 1, None, |this, args| {
            let document = this_object(this)?;
            let id = ops::to_string(&arg(args, 0));
            let Value::Object(all) = document.get("all") else {
                return Ok(Value::Null);
            };
            for candidate in all.items().unwrap_or_default() {
                if let Value::Object(el) = &candidate {
                    let by_prop = ops::to_string(&el.get("id")) == id;
                    let by_attr = match el.get("attributes") {
                        Value::Object(attrs) => ops::to_string(&attrs.get("id")) == id,
                        _ => false,
                    };
                    if by_prop || by_attr {
                        return Ok(candidate.clone());
                    }
                }
            }
            Ok(Value::Null)
        })),
    );
    let body = element("body");
    document.set("body", Value::Object(body));
    context.set("document", Value::Object(document));
    context.set("window", Value::Object(context.clone()));

    let jquery = Func::native("jQuery", 1, Some(HostClass::JQuery), |_, args| {
        Ok(Value::Object(wrap(arg(args, 0))))
    });
    context.set("jQuery", Value::Func(jquery.clone()));
    context.set("$", Value::Func(jquery));

    context.set(
        "CSSStyleDeclaration",
        Value::Func(Func::native(
            "CSSStyleDeclaration",
            0,
            Some(HostClass::CssStyleDeclaration),
            |_, _| Ok(Value::Undefined),
        )),
    );
    context.set(
        "DOMTokenList",
        Value::Func(Func::native(
            "DOMTokenList",
            0,
            Some(HostClass::DomTokenList),
            |_, _| Ok(Value::Undefined),
        )),
    );
    context.set(
        "Attr",
        Value::Func(Func::native("Attr", 0, Some(HostClass::Attr), |_, _| {
            Ok(Value::Undefined)
        })),
    );
    context.set(
        "RegExp",
        Value::Func(Func::native("RegExp", 2, Some(HostClass::RegExp), |this, args| {
            let object = this_object(this)?;
            let pattern = ops::to_string(&arg(args, 0));
            let flags = ops::to_string(&arg(args, 1));
            init_regexp(&object, &pattern, &flags);
            Ok(Value::Undefined)
        })),
    );

    context
}

/// Build an element double.
pub fn element(tag: &str) -> Object {
    let element = Object::of_class(HostClass::Element);
    element.set("tagName", Value::Str(tag.to_uppercase().into()));

    element.set(
        "style",
        Value::Object(Object::of_class(HostClass::CssStyleDeclaration)),
    );

    let class_list = Object::array_of_class(HostClass::DomTokenList, vec![]);
    class_list.set(
        "add",
        Value::Func(Func::native("add", 1, None, |this, args| {
            let list = this_object(this)?;
            for token in args {
                let token = ops::to_string(token);
                if !list.items().unwrap_or_default().iter().any(|t| is_token(t, &token))
                {
                    list.push(Value::Str(token));
                }
            }
            Ok(Value::Undefined)
        })),
    );
    class_list.set(
        "remove",
        Value::Func(Func::native("remove", 1, None, |this, args| {
            let list = this_object(this)?;
            let tokens: Vec<EcoString> = args.iter().map(ops::to_string).collect();
            list.retain_items(|item| !tokens.iter().any(|t| is_token(item, t)));
            Ok(Value::Undefined)
        })),
    );
    class_list.set(
        "toggle",
        Value::Func(Func::native("toggle", 1, None, |this, args| {
            let list = this_object(this)?;
            let token = ops::to_string(&arg(args, 0));
            if list.items().unwrap_or_default().iter().any(|t| is_token(t, &token)) {
                list.retain_items(|item| !is_token(item, &token));
                Ok(Value::Bool(false))
            } else {
                list.push(Value::Str(token));
                Ok(Value::Bool(true))
            }
        })),
    );
    class_list.set(
        "contains",
        Value::Func(Func::native("contains", 1, None, |this, args| {
            let list = this_object(this)?;
            let token = ops::to_string(&arg(args, 0));
            Ok(Value::Bool(
                list.items().unwrap_or_default().iter().any(|t| is_token(t, &token)),
            ))
        })),
    );
    element.set("classList", Value::Object(class_list));

    element.set("attributes", Value::Object(Object::new()));
    element.set("children", Value::Object(Object::array(vec![])));
    element.set("listeners", Value::Object(Object::new()));

    element.set(
        "setAttribute",
        Value::Func(Func::native("setAttribute", 2, None, |this, args| {
            let element = this_object(this)?;
            let name = ops::to_string(&arg(args, 0));
            let value = ops::to_string(&arg(args, 1));
            if let Value::Object(attrs) = element.get("attributes") {
                attrs.set(name, Value::Str(value));
            }
            Ok(Value::Undefined)
        })),
    );
    element.set(
        "getAttribute",
        Value::Func(Func::native("getAttribute", 1, None, |this, args| {
            let element = this_object(this)?;
            let name = ops::to_string(&arg(args, 0));
            match element.get("attributes") {
                Value::Object(attrs) if attrs.has(&name) => Ok(attrs.get(&name)),
                _ => Ok(Value::Null),
            }
        })),
    );
    element.set(
        "removeAttribute",
        Value::Func(Func::native("removeAttribute", 1, None, |this, args| {
            let element = this_object(this)?;
            let name = ops::to_string(&arg(args, 0));
            if let Value::Object(attrs) = element.get("attributes") {
                attrs.delete(&name);
            }
            Ok(Value::Undefined)
        })),
    );
    element.set(
        "getAttributeNode",
        Value::Func(Func::native("getAttributeNode", 1, None, |this, args| {
            let element = this_object(this)?;
            let name = ops::to_string(&arg(args, 0));
            let Value::Object(attrs) = element.get("attributes") else {
                return Ok(Value::Null);
            };
            if !attrs.has(&name) {
                return Ok(Value::Null);
            }
            let node = Object::of_class(HostClass::Attr);
            node.set("name", Value::Str(name.clone()));
            node.set("value", attrs.get(&name));
            node.set("ownerElement", Value::Object(element.clone()));
            Ok(Value::Object(node))
        })),
    );
    element.set(
        "appendChild",
        Value::Func(Func::native("appendChild", 1, None, |this, args| {
            let element = this_object(this)?;
            let child = arg(args, 0);
            if let Value::Object(children) = element.get("children") {
                children.push(child.clone());
            }
            if let Value::Object(node) = &child {
                node.set("parentNode", Value::Object(element));
            }
            Ok(child)
        })),
    );
    element.set(
        "removeChild",
        Value::Func(Func::native("removeChild", 1, None, |this, args| {
            let element = this_object(this)?;
            let child = arg(args, 0);
            if let Value::Object(children) = element.get("children") {
                children.retain_items(|item| item != &child);
            }
            Ok(child)
        })),
    );
    element.set(
        "addEventListener",
        Value::Func(Func::native("addEventListener", 2, None, |this, args| {
            let element = this_object(this)?;
            let kind = ops::to_string(&arg(args, 0));
            if let Value::Object(listeners) = element.get("listeners") {
                listeners.set(kind, arg(args, 1));
            }
            Ok(Value::Undefined)
        })),
    );
    element.set(
        "removeEventListener",
        Value::Func(Func::native("removeEventListener", 2, None, |this, args| {
            let element = this_object(this)?;
            let kind = ops::to_string(&arg(args, 0));
            if let Value::Object(listeners) = element.get("listeners") {
                listeners.delete(&kind);
            }
            Ok(Value::Undefined)
        })),
    );

    element
}

/// Build a regex value from a pattern and flag string.
pub fn regexp(pattern: &str, flags: &str) -> Object {
    let object = Object::of_class(HostClass::RegExp);
    init_regexp(&object, pattern, flags);
    object
}

fn init_regexp(object: &Object, pattern: &str, flags: &str) {
    object.set("source", Value::Str(pattern.into()));
    object.set("flags", Value::Str(flags.into()));
    object.set("lastIndex", Value::Num(0.0));
    object.set(
        "test",
        Value::Func(Func::native("test", 1, None, |this, args| {
            let object = this_object(this)?;
            let haystack = ops::to_string(&arg(args, 0));
            Ok(Value::Bool(object.regex_is_match(&haystack).unwrap_or(false)))
        })),
    );

    // Only the inline-translatable flags survive the trip to the host regex
    // engine; `g` and `y` affect iteration state, not matching.
    let inline: EcoString = flags.chars().filter(|c| "ims".contains(*c)).collect();
    let translated = if inline.is_empty() {
        EcoString::from(pattern)
    } else {
        eco_format!("(?{inline}){pattern}")
    };
    if let Ok(regex) = regex::Regex::new(&translated) {
        object.set_regex(regex);
    }
}

/// Wrap a value into a jQuery set double.
pub fn wrap(target: Value) -> Object {
    let items = match &target {
        Value::Object(object) if object.is(HostClass::JQuery) => {
            object.items().unwrap_or_default()
        }
        Value::Object(object) if object.is(HostClass::Element) => vec![target.clone()],
        Value::Object(object) if object.is_array() => object.items().unwrap_or_default(),
        _ => vec![],
    };

    let set = Object::array_of_class(HostClass::JQuery, items);
    set.set(
        "get",
        Value::Func(Func::native("get", 0, None, |this, args| {
            let set = this_object(this)?;
            let items = set.items().unwrap_or_default();
            match args.first() {
                Some(index) => {
                    let index = ops::to_number(index) as usize;
                    Ok(items.get(index).cloned().unwrap_or_default())
                }
                None => Ok(Value::Object(Object::array(items))),
            }
        })),
    );
    set.set(
        "addClass",
        Value::Func(Func::native("addClass", 1, None, |this, args| {
            each_class_list(this, |list| {
                for token in ops::to_string(&arg(args, 0)).split_whitespace() {
                    let token = EcoString::from(token);
                    if !list.items().unwrap_or_default().iter().any(|t| is_token(t, &token))
                    {
                        list.push(Value::Str(token));
                    }
                }
            })
        })),
    );
    set.set(
        "removeClass",
        Value::Func(Func::native("removeClass", 1, None, |this, args| {
            each_class_list(this, |list| {
                let tokens: Vec<EcoString> = ops::to_string(&arg(args, 0))
                    .split_whitespace()
                    .map(EcoString::from)
                    .collect();
                list.retain_items(|item| !tokens.iter().any(|t| is_token(item, t)));
            })
        })),
    );
    set.set(
        "css",
        Value::Func(Func::native("css", 2, None, |this, args| {
            let set = this_object(this)?;
            let name = ops::to_string(&arg(args, 0));
            if args.len() < 2 {
                let first = set.items().unwrap_or_default().into_iter().next();
                return Ok(match first {
                    Some(Value::Object(el)) => match el.get("style") {
                        Value::Object(style) => style.get(&name),
                        _ => Value::Undefined,
                    },
                    _ => Value::Undefined,
                });
            }
            for item in set.items().unwrap_or_default() {
                if let Value::Object(el) = item
                    && let Value::Object(style) = el.get("style")
                {
                    style.set(name.clone(), arg(args, 1));
                }
            }
            Ok(Value::Object(set))
        })),
    );
    set.set(
        "attr",
        Value::Func(Func::native("attr", 2, None, |this, args| {
            let set = this_object(this)?;
            let name = ops::to_string(&arg(args, 0));
            if args.len() < 2 {
                let first = set.items().unwrap_or_default().into_iter().next();
                return Ok(match first {
                    Some(Value::Object(el)) => match el.get("attributes") {
                        Value::Object(attrs) => attrs.get(&name),
                        _ => Value::Undefined,
                    },
                    _ => Value::Undefined,
                });
            }
            for item in set.items().unwrap_or_default() {
                if let Value::Object(el) = item
                    && let Value::Object(attrs) = el.get("attributes")
                {
                    attrs.set(name.clone(), Value::Str(ops::to_string(&arg(args, 1))));
                }
            }
            Ok(Value::Object(set))
        })),
    );

    set
}

fn each_class_list(this: &Value, f: impl Fn(&Object)) -> crate::diag::StrResult<Value> {
    let set = this_object(this)?;
    for item in set.items().unwrap_or_default() {
        if let Value::Object(el) = item
            && let Value::Object(list) = el.get("classList")
        {
            f(&list);
        }
    }
    Ok(Value::Object(set))
}

fn is_token(item: &Value, token: &str) -> bool {
    matches!(item, Value::Str(s) if s == token)
}

fn this_object(this: &Value) -> crate::diag::StrResult<Object> {
    this.as_object()
        .cloned()
        .ok_or_else(|| EcoString::from("receiver is not an object"))
}

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_default()
}

/// The reference checker: classifies the DOM-facing API surface of the
/// doubles above.
pub struct DomApiChecker;

impl Checker for DomApiChecker {
    fn dispatch(&self, site: CheckSite) -> Option<Status> {
        use HostClass::*;

        let class = site.caller.as_object().and_then(|object| object.class())?;
        match &site.callee {
            SiteCallee::Method { key, args } => match (class, *key) {
                (Element, "setAttribute" | "removeAttribute") => attr(),
                (Element, "appendChild" | "removeChild") => node(),
                (Element, "addEventListener" | "removeEventListener") => behavior(),
                (DomTokenList, "add" | "remove" | "toggle") => attr(),
                (CssStyleDeclaration, "setProperty" | "removeProperty") => style(),
                (JQuery, "addClass" | "removeClass" | "toggleClass") => attr(),
                (JQuery, "attr" | "prop") if args.len() >= 2 => attr(),
                (JQuery, "css") if args.len() >= 2 => style(),
                (JQuery, "append" | "appendTo" | "remove" | "empty") => node(),
                (JQuery, "on" | "off" | "bind" | "unbind") => behavior(),
                _ => None,
            },
            SiteCallee::Assign { key, .. } => match (class, *key) {
                (CssStyleDeclaration, _) => style(),
                (Attr, "value") => attr(),
                (Element, "id" | "className" | "value" | "src" | "href") => attr(),
                (Element, "innerHTML" | "textContent") => node(),
                _ => None,
            },
        }
    }
}

fn attr() -> Option<Status> {
    Some(Status::of_kind("attr"))
}

fn node() -> Option<Status> {
    Some(Status::of_kind("node"))
}

fn behavior() -> Option<Status> {
    Some(Status::of_kind("behavior"))
}

fn style() -> Option<Status> {
    Some(Status::of_kind("style"))
}
