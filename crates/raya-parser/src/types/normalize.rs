//! Type normalization utilities
//!
//! Provides functions to simplify and normalize types into canonical forms.

use super::context::TypeContext;
use super::ty::{Type, TypeId};

/// Normalize a type to its canonical form
///
/// Normalization includes:
/// - Flattening nested unions
/// - Removing duplicate union members
/// - Sorting union members for consistency
/// - Simplifying single-member unions
/// - Removing `never` from unions (unless it's the only member)
pub fn normalize_type(ctx: &mut TypeContext, ty: TypeId) -> TypeId {
    let ty_data = match ctx.get(ty) {
        Some(t) => t.clone(),
        None => return ty,
    };

    match ty_data {
        Type::Union(union) => normalize_union(ctx, &union.members),
        Type::Array(arr) => {
            let elem = normalize_type(ctx, arr.element);
            ctx.array_type(elem)
        }
        Type::Tuple(tuple) => {
            let elements: Vec<_> = tuple
                .elements
                .iter()
                .map(|&e| normalize_type(ctx, e))
                .collect();
            ctx.tuple_type(elements)
        }
        Type::Function(func) => {
            let params: Vec<_> = func
                .params
                .iter()
                .map(|&p| normalize_type(ctx, p))
                .collect();
            let return_type = normalize_type(ctx, func.return_type);
            ctx.function_type(params, return_type, func.is_async)
        }
        _ => ty,
    }
}

/// Normalize a union type
fn normalize_union(
    ctx: &mut TypeContext,
    members: &[TypeId],
) -> TypeId {
    let never = ctx.never_type();
    let mut normalized_members = Vec::new();

    // Flatten nested unions and collect all members
    for &member in members {
        let member_normalized = normalize_type(ctx, member);

        if let Some(Type::Union(nested)) = ctx.get(member_normalized) {
            // Flatten nested union
            for &nested_member in &nested.members {
                normalized_members.push(nested_member);
            }
        } else {
            normalized_members.push(member_normalized);
        }
    }

    // Remove `never` from union (unless it's the only member)
    if normalized_members.len() > 1 {
        normalized_members.retain(|&m| m != never);
    }

    // If empty after removing never, return never
    if normalized_members.is_empty() {
        return never;
    }

    // Sort for consistency
    normalized_members.sort_unstable_by_key(|id| id.0);

    // Remove duplicates
    normalized_members.dedup();

    // Single member union is just the member
    if normalized_members.len() == 1 {
        return normalized_members[0];
    }

    // Discriminant will be inferred automatically
    ctx.union_type(normalized_members)
}

/// Simplify a type by removing unnecessary complexity
///
/// This is more aggressive than normalization and may change semantics slightly.
pub fn simplify_type(ctx: &mut TypeContext, ty: TypeId) -> TypeId {
    let ty_data = match ctx.get(ty) {
        Some(t) => t.clone(),
        None => return ty,
    };

    match ty_data {
        Type::Union(union) => {
            let unknown = ctx.unknown_type();

            // If union contains unknown, the whole thing is unknown
            if union.members.contains(&unknown) {
                return unknown;
            }

            // Otherwise normalize
            normalize_union(ctx, &union.members)
        }
        _ => normalize_type(ctx, ty),
    }
}

/// Check if a type is a subtype of unknown (i.e., any type except never)
pub fn is_concrete_type(ctx: &TypeContext, ty: TypeId) -> bool {
    !matches!(ctx.get(ty), Some(Type::Never))
}

/// Check if a type contains type variables
pub fn contains_type_variables(ctx: &TypeContext, ty: TypeId) -> bool {
    let ty_data = match ctx.get(ty) {
        Some(t) => t,
        None => return false,
    };

    match ty_data {
        Type::TypeVar(_) => true,
        Type::Array(arr) => contains_type_variables(ctx, arr.element),
        Type::Tuple(tuple) => tuple.elements.iter().any(|&e| contains_type_variables(ctx, e)),
        Type::Function(func) => {
            func.params.iter().any(|&p| contains_type_variables(ctx, p))
                || contains_type_variables(ctx, func.return_type)
        }
        Type::Union(union) => union.members.iter().any(|&m| contains_type_variables(ctx, m)),
        Type::Generic(gen) => {
            contains_type_variables(ctx, gen.base)
                || gen.type_args.iter().any(|&a| contains_type_variables(ctx, a))
        }
        _ => false,
    }
}

/// Get the arity (number of parameters) of a function type
pub fn function_arity(ctx: &TypeContext, ty: TypeId) -> Option<usize> {
    match ctx.get(ty) {
        Some(Type::Function(func)) => Some(func.params.len()),
        _ => None,
    }
}

/// Check if a type is a function type
pub fn is_function_type(ctx: &TypeContext, ty: TypeId) -> bool {
    matches!(ctx.get(ty), Some(Type::Function(_)))
}

/// Check if a type is a union type
pub fn is_union_type(ctx: &TypeContext, ty: TypeId) -> bool {
    matches!(ctx.get(ty), Some(Type::Union(_)))
}

/// Get all primitive types from a union (if it's a bare primitive union)
pub fn extract_primitive_union_members(
    ctx: &TypeContext,
    ty: TypeId,
) -> Option<Vec<super::ty::PrimitiveType>> {
    match ctx.get(ty) {
        Some(Type::Union(union)) => {
            let mut primitives = Vec::new();
            for &member in &union.members {
                match ctx.get(member) {
                    Some(Type::Primitive(p)) => primitives.push(*p),
                    _ => return None, // Not a bare primitive union
                }
            }
            Some(primitives)
        }
        Some(Type::Primitive(p)) => Some(vec![*p]),
        _ => None,
    }
}
