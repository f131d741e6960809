//! Binding assembler: turns finished method/signal/property units into
//! entries on the three class descriptors of the node under construction.
//!
//! Everything here is a transformation on the [`NodeScope`] value owned by
//! the compiler; nothing is rendered, only wiring instructions are
//! recorded for the emitter.

use std::collections::BTreeSet;

use crate::compile::NodeScope;
use crate::model::{
    Argument, ClassDescriptor, Constructor, Instruction, MemberSlot, MethodDef, MethodKind,
    MethodSpec, NodeBindingSet, ParentClass, PropertySpec, SignalSpec, SlotKind, TypeExpression,
};

fn connection_ty() -> TypeExpression {
    TypeExpression::primitive_with("Connection", "busbind::Connection")
}

fn dispatch_ty() -> TypeExpression {
    TypeExpression::primitive_with("DispatchThread", "busbind::DispatchThread")
}

fn string_ty() -> TypeExpression {
    TypeExpression::primitive("String")
}

/// Open a new node scope: three empty class descriptors plus the factory
/// methods and constructor shells every node carries.
pub(crate) fn start_node(
    stem: &str,
    namespace: Option<String>,
    destination: Option<String>,
    path: Option<String>,
) -> NodeScope {
    let proxy_name = format!("{stem}Proxy");
    let adapter_name = format!("{stem}Adapter");
    let adaptee_name = format!("{stem}Adaptee");

    let mut proxy = ClassDescriptor::named(&proxy_name);
    proxy.namespace = namespace;
    proxy.parent = Some(ParentClass {
        name: "busbind::ObjectProxy".to_string(),
        init_args: vec![
            "connection".to_string(),
            "destination".to_string(),
            "path".to_string(),
        ],
    });
    proxy.requires = [
        "busbind::Connection",
        "busbind::DispatchThread",
        "busbind::ObjectProxy",
    ]
    .into_iter()
    .map(str::to_string)
    .collect();
    proxy.methods.push(MethodDef {
        name: "create".to_string(),
        kind: MethodKind::Factory,
        args: vec![
            Argument {
                name: "connection".to_string(),
                ty: connection_ty(),
            },
            Argument {
                name: "destination".to_string(),
                ty: string_ty(),
            },
            Argument {
                name: "path".to_string(),
                ty: string_ty(),
            },
            Argument {
                name: "signal_dispatch".to_string(),
                ty: dispatch_ty(),
            },
        ],
        ret: Some(TypeExpression::primitive(&proxy_name)),
        body: vec![Instruction::Construct {
            class: proxy_name.clone(),
            args: vec![
                "connection".to_string(),
                "destination".to_string(),
                "path".to_string(),
                "signal_dispatch".to_string(),
            ],
        }],
    });
    let proxy_ctor = Constructor {
        args: vec![
            Argument {
                name: "connection".to_string(),
                ty: connection_ty(),
            },
            Argument {
                name: "destination".to_string(),
                ty: string_ty(),
            },
            Argument {
                name: "path".to_string(),
                ty: string_ty(),
            },
            Argument {
                name: "signal_dispatch".to_string(),
                ty: dispatch_ty(),
            },
        ],
        instructions: Vec::new(),
    };

    let mut adapter = ClassDescriptor::named(&adapter_name);
    adapter.parent = Some(ParentClass {
        name: "busbind::Object".to_string(),
        init_args: vec!["path".to_string()],
    });
    adapter.requires = [
        "busbind::Connection",
        "busbind::DispatchThread",
        "busbind::Object",
        "busbind::RegistrationStatus",
    ]
    .into_iter()
    .map(str::to_string)
    .collect();
    adapter.methods.push(MethodDef {
        name: "create".to_string(),
        kind: MethodKind::Factory,
        args: vec![
            Argument {
                name: "adaptee".to_string(),
                ty: TypeExpression::primitive(&adaptee_name),
            },
            Argument {
                name: "path".to_string(),
                ty: string_ty(),
            },
        ],
        ret: Some(TypeExpression::primitive(&adapter_name)),
        body: vec![Instruction::Construct {
            class: adapter_name.clone(),
            args: vec!["adaptee".to_string(), "path".to_string()],
        }],
    });
    adapter.methods.push(MethodDef {
        name: "create_registered".to_string(),
        kind: MethodKind::Factory,
        args: vec![
            Argument {
                name: "connection".to_string(),
                ty: connection_ty(),
            },
            Argument {
                name: "dispatch".to_string(),
                ty: dispatch_ty(),
            },
            Argument {
                name: "adaptee".to_string(),
                ty: TypeExpression::primitive(&adaptee_name),
            },
            Argument {
                name: "path".to_string(),
                ty: string_ty(),
            },
        ],
        ret: Some(TypeExpression::primitive(&adapter_name)),
        body: vec![
            Instruction::Construct {
                class: adapter_name.clone(),
                args: vec!["adaptee".to_string(), "path".to_string()],
            },
            Instruction::RegisterObject {
                object: "adapter".to_string(),
                connection: "connection".to_string(),
                dispatch: "dispatch".to_string(),
            },
        ],
    });
    let adapter_ctor = Constructor {
        args: vec![
            Argument {
                name: "adaptee".to_string(),
                ty: TypeExpression::primitive(&adaptee_name),
            },
            Argument {
                name: "path".to_string(),
                ty: string_ty(),
            },
        ],
        instructions: Vec::new(),
    };

    let adaptee = ClassDescriptor::named(&adaptee_name);

    NodeScope {
        set: NodeBindingSet {
            destination,
            path,
            proxy,
            adapter,
            adaptee,
        },
        interface: String::new(),
        proxy_ctor,
        adapter_ctor,
        unit: None,
    }
}

/// Auxiliary per-type imports are declared by the callee-side pair; the
/// proxy only carries its node-level baseline.
pub(crate) fn add_type_requires(scope: &mut NodeScope, requires: &BTreeSet<String>) {
    scope
        .set
        .adapter
        .requires
        .extend(requires.iter().cloned());
    scope
        .set
        .adaptee
        .requires
        .extend(requires.iter().cloned());
}

pub(crate) fn finish_method(scope: &mut NodeScope, method: MethodSpec) {
    let slot = format!("method_{}", method.name);
    let arg_names: Vec<String> = method.args.iter().map(|a| a.name.clone()).collect();
    let arg_types: Vec<TypeExpression> = method.args.iter().map(|a| a.ty.clone()).collect();

    scope.set.proxy.members.push(MemberSlot {
        name: slot.clone(),
        kind: SlotKind::MethodHandle,
        ret: method.ret.clone(),
        args: arg_types,
    });
    scope.set.proxy.methods.push(MethodDef {
        name: method.name.clone(),
        kind: MethodKind::Instance,
        args: method.args.clone(),
        ret: method.ret.clone(),
        body: vec![Instruction::ForwardCall {
            slot: slot.clone(),
            args: arg_names,
            returns: method.ret.is_some(),
        }],
    });
    scope.proxy_ctor.instructions.push(Instruction::RegisterMethod {
        slot,
        interface: scope.interface.clone(),
        method: method.name.clone(),
    });

    scope.set.adaptee.methods.push(MethodDef {
        name: method.name.clone(),
        kind: MethodKind::Abstract,
        args: method.args.clone(),
        ret: method.ret,
        body: Vec::new(),
    });

    scope.adapter_ctor.instructions.push(Instruction::BindMethod {
        interface: scope.interface.clone(),
        method: method.name.clone(),
        operation: method.name,
    });
    // Ordinal 0 names the return value, even when there is none.
    scope.adapter_ctor.instructions.push(Instruction::SetArgName {
        ordinal: 0,
        name: method.ret_name,
    });
    for (ordinal, arg) in method.args.iter().enumerate() {
        scope.adapter_ctor.instructions.push(Instruction::SetArgName {
            ordinal: ordinal + 1,
            name: arg.name.clone(),
        });
    }
}

pub(crate) fn finish_signal(scope: &mut NodeScope, signal: SignalSpec) {
    let emit_slot = format!("signal_{}", signal.name);
    let proxy_slot = format!("signal_proxy_{}", signal.name);
    let accessor = format!("signal_{}", signal.name);
    let arg_names: Vec<String> = signal.args.iter().map(|a| a.name.clone()).collect();
    let arg_types: Vec<TypeExpression> = signal.args.iter().map(|a| a.ty.clone()).collect();

    scope.set.adapter.members.push(MemberSlot {
        name: emit_slot.clone(),
        kind: SlotKind::SignalEmitter,
        ret: None,
        args: arg_types.clone(),
    });
    scope.set.adapter.methods.push(MethodDef {
        name: signal.name.clone(),
        kind: MethodKind::Instance,
        args: signal.args.clone(),
        ret: None,
        body: vec![Instruction::EmitSignal {
            slot: emit_slot.clone(),
            args: arg_names,
        }],
    });
    scope.set.adapter.methods.push(MethodDef {
        name: accessor.clone(),
        kind: MethodKind::Instance,
        args: Vec::new(),
        ret: None,
        body: vec![Instruction::ReturnSlot {
            slot: emit_slot.clone(),
        }],
    });
    scope.adapter_ctor.instructions.push(Instruction::RegisterSignal {
        slot: emit_slot,
        interface: scope.interface.clone(),
        signal: signal.name.clone(),
    });

    scope.set.proxy.members.push(MemberSlot {
        name: proxy_slot.clone(),
        kind: SlotKind::SignalSubscription,
        ret: None,
        args: arg_types,
    });
    scope.set.proxy.methods.push(MethodDef {
        name: accessor,
        kind: MethodKind::Instance,
        args: Vec::new(),
        ret: None,
        body: vec![Instruction::ReturnSlot {
            slot: proxy_slot.clone(),
        }],
    });
    // The dispatch selection is the caller's: the instruction names the
    // constructor parameter whose value is passed through unmodified.
    scope.proxy_ctor.instructions.push(Instruction::SubscribeSignal {
        slot: proxy_slot,
        interface: scope.interface.clone(),
        signal: signal.name,
        dispatch: "signal_dispatch".to_string(),
    });
}

pub(crate) fn finish_property(scope: &mut NodeScope, property: PropertySpec) {
    if property.access.readable() {
        scope.set.proxy.methods.push(MethodDef {
            name: property.name.clone(),
            kind: MethodKind::Instance,
            args: Vec::new(),
            ret: Some(property.ty.clone()),
            body: vec![Instruction::GetProperty {
                name: property.name.clone(),
            }],
        });
    }
    if property.access.writable() {
        scope.set.proxy.methods.push(MethodDef {
            name: format!("set_{}", property.name),
            kind: MethodKind::Instance,
            args: vec![Argument {
                name: property.name.clone(),
                ty: property.ty,
            }],
            ret: None,
            body: vec![Instruction::SetProperty {
                name: property.name.clone(),
                arg: property.name,
            }],
        });
    }
}

pub(crate) fn finish_node(mut scope: NodeScope) -> NodeBindingSet {
    scope.set.proxy.constructor = Some(scope.proxy_ctor);
    scope.set.adapter.constructor = Some(scope.adapter_ctor);
    scope.set
}
