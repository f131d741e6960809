use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use busbind_contracts::BINDING_MODEL_SCHEMA_VERSION;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeTag {
    Primitive,
    Array,
    Struct,
    DictEntry,
    Variant,
}

/// One decoded wire type.
///
/// `requires` holds the import paths a consumer of this type must declare
/// (runtime types and `std` collections); it covers this node only, see
/// [`TypeExpression::collect_requires`] for the whole tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeExpression {
    pub tag: TypeTag,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TypeExpression>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub requires: BTreeSet<String>,
}

impl TypeExpression {
    pub fn primitive(name: impl Into<String>) -> Self {
        Self {
            tag: TypeTag::Primitive,
            name: Some(name.into()),
            children: Vec::new(),
            requires: BTreeSet::new(),
        }
    }

    pub fn primitive_with(name: impl Into<String>, require: impl Into<String>) -> Self {
        let mut requires = BTreeSet::new();
        requires.insert(require.into());
        Self {
            tag: TypeTag::Primitive,
            name: Some(name.into()),
            children: Vec::new(),
            requires,
        }
    }

    pub fn array(element: TypeExpression) -> Self {
        Self {
            tag: TypeTag::Array,
            name: Some("Vec".to_string()),
            children: vec![element],
            requires: BTreeSet::new(),
        }
    }

    pub fn structure(members: Vec<TypeExpression>) -> Self {
        Self {
            tag: TypeTag::Struct,
            name: None,
            children: members,
            requires: BTreeSet::new(),
        }
    }

    pub fn dict_entry(key: TypeExpression, value: TypeExpression) -> Self {
        let mut requires = BTreeSet::new();
        requires.insert("std::collections::HashMap".to_string());
        Self {
            tag: TypeTag::DictEntry,
            name: Some("HashMap".to_string()),
            children: vec![key, value],
            requires,
        }
    }

    pub fn variant() -> Self {
        let mut requires = BTreeSet::new();
        requires.insert("busbind::Variant".to_string());
        Self {
            tag: TypeTag::Variant,
            name: Some("Variant".to_string()),
            children: Vec::new(),
            requires,
        }
    }

    /// Gather the import requirements of this type and every nested type.
    pub fn collect_requires(&self, out: &mut BTreeSet<String>) {
        out.extend(self.requires.iter().cloned());
        for child in &self.children {
            child.collect_requires(out);
        }
    }

    /// Human-readable type text, e.g. `Vec<HashMap<String, i32>>`.
    pub fn render(&self) -> String {
        match self.tag {
            TypeTag::Primitive | TypeTag::Variant => {
                self.name.clone().unwrap_or_default()
            }
            TypeTag::Array | TypeTag::DictEntry => {
                let inner: Vec<String> = self.children.iter().map(|c| c.render()).collect();
                format!(
                    "{}<{}>",
                    self.name.as_deref().unwrap_or_default(),
                    inner.join(", ")
                )
            }
            TypeTag::Struct => {
                let inner: Vec<String> = self.children.iter().map(|c| c.render()).collect();
                format!("({})", inner.join(", "))
            }
        }
    }
}

impl fmt::Display for TypeExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "in" => Some(Direction::In),
            "out" => Some(Direction::Out),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Argument {
    pub name: String,
    pub ty: TypeExpression,
}

/// A finished method: inbound arguments in document order, at most one
/// promoted return type, and the return-value name registered at ordinal 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSpec {
    pub name: String,
    pub args: Vec<Argument>,
    pub ret: Option<TypeExpression>,
    pub ret_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalSpec {
    pub name: String,
    pub args: Vec<Argument>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyAccess {
    Read,
    Write,
    ReadWrite,
}

impl PropertyAccess {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "read" => Some(PropertyAccess::Read),
            "write" => Some(PropertyAccess::Write),
            "readwrite" => Some(PropertyAccess::ReadWrite),
            _ => None,
        }
    }

    pub fn readable(self) -> bool {
        matches!(self, PropertyAccess::Read | PropertyAccess::ReadWrite)
    }

    pub fn writable(self) -> bool {
        matches!(self, PropertyAccess::Write | PropertyAccess::ReadWrite)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySpec {
    pub name: String,
    pub ty: TypeExpression,
    pub access: PropertyAccess,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    MethodHandle,
    SignalEmitter,
    SignalSubscription,
}

/// A private member of a generated class holding a runtime handle,
/// parameterized by the wire types flowing through it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberSlot {
    pub name: String,
    pub kind: SlotKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ret: Option<TypeExpression>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<TypeExpression>,
}

/// One wiring step in a method body or constructor, to be rendered by an
/// emitter against the runtime library's API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Instruction {
    /// Invoke the bound call handle in `slot` with the named arguments,
    /// returning its result when `returns` is set.
    ForwardCall {
        slot: String,
        args: Vec<String>,
        returns: bool,
    },
    /// Return the member slot itself (channel accessors).
    ReturnSlot { slot: String },
    /// Publish through the emit channel in `slot`, arguments forwarded
    /// positionally.
    EmitSignal { slot: String, args: Vec<String> },
    GetProperty { name: String },
    SetProperty { name: String, arg: String },
    /// Initialize `slot` by registering `(interface, method)` with the
    /// runtime.
    RegisterMethod {
        slot: String,
        interface: String,
        method: String,
    },
    /// Wire the runtime's dispatch of `(interface, method)` to the adaptee
    /// operation named `operation`.
    BindMethod {
        interface: String,
        method: String,
        operation: String,
    },
    /// Record an argument name in the runtime's introspection metadata.
    /// Ordinal 0 is the return value.
    SetArgName { ordinal: usize, name: String },
    RegisterSignal {
        slot: String,
        interface: String,
        signal: String,
    },
    /// Proxy-side subscription; `dispatch` names the constructor parameter
    /// whose value selects the execution context delivering notifications.
    SubscribeSignal {
        slot: String,
        interface: String,
        signal: String,
        dispatch: String,
    },
    Construct { class: String, args: Vec<String> },
    RegisterObject {
        object: String,
        connection: String,
        dispatch: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    Instance,
    Factory,
    /// Not-yet-implemented operation to be supplied by user code.
    Abstract,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodDef {
    pub name: String,
    pub kind: MethodKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Argument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ret: Option<TypeExpression>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub body: Vec<Instruction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Constructor {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Argument>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub instructions: Vec<Instruction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParentClass {
    pub name: String,
    pub init_args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassDescriptor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<ParentClass>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub requires: BTreeSet<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<MemberSlot>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodDef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constructor: Option<Constructor>,
}

impl ClassDescriptor {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            parent: None,
            requires: BTreeSet::new(),
            members: Vec::new(),
            methods: Vec::new(),
            constructor: None,
        }
    }

    pub fn method(&self, name: &str) -> Option<&MethodDef> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn member(&self, name: &str) -> Option<&MemberSlot> {
        self.members.iter().find(|m| m.name == name)
    }
}

/// The three mirrored class descriptors produced for one `node` element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeBindingSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub proxy: ClassDescriptor,
    pub adapter: ClassDescriptor,
    pub adaptee: ClassDescriptor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindingModel {
    pub schema_version: String,
    pub nodes: Vec<NodeBindingSet>,
}

impl BindingModel {
    pub fn new(nodes: Vec<NodeBindingSet>) -> Self {
        Self {
            schema_version: BINDING_MODEL_SCHEMA_VERSION.to_string(),
            nodes,
        }
    }
}
