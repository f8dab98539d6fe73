//! # Object Registry
//!
//! Hands out object numbers and keeps the objects behind them. Numbers
//! start at 1, only ever grow and are never reused. A number can be
//! reserved before its object exists, so objects can point at each other
//! in either order; every reserved number must be defined before the
//! document is written.
//!
//! Dedup-eligible objects go through [`ObjectRegistry::find_or_register`],
//! which returns the existing number for a structurally equal object.
//! Canonicalized objects must not be mutated afterwards, since their key
//! would no longer match their content.

use std::collections::{BTreeSet, HashMap};

use super::object::{ObjRef, ObjectKind, PdfObject, StructuralKey};
use crate::error::{FolioError, Result};

#[derive(Debug, Default)]
pub struct ObjectRegistry {
    /// Slot `n - 1` holds object `n`.
    slots: Vec<Option<PdfObject>>,
    trailer: BTreeSet<ObjRef>,
    canonical: HashMap<StructuralKey, ObjRef>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns the next number without an object behind it yet.
    pub fn reserve(&mut self) -> ObjRef {
        self.slots.push(None);
        ObjRef::new(self.slots.len() as u32)
    }

    /// Gives a reserved number its object.
    pub fn define(&mut self, r: ObjRef, obj: PdfObject) -> Result<()> {
        let slot = r
            .number()
            .checked_sub(1)
            .and_then(|i| self.slots.get_mut(i as usize))
            .ok_or_else(|| FolioError::MissingStructure {
                structure: "object number",
                detail: format!("{} was never reserved", r),
            })?;
        if slot.is_some() {
            return Err(FolioError::DuplicateAssignment(r));
        }
        *slot = Some(obj);
        Ok(())
    }

    /// Assigns a number and stores `obj` under it.
    pub fn register(&mut self, obj: PdfObject) -> ObjRef {
        self.slots.push(Some(obj));
        ObjRef::new(self.slots.len() as u32)
    }

    /// Registers an object the trailer or catalog refers to.
    pub fn add_trailer_object(&mut self, obj: PdfObject) -> ObjRef {
        let r = self.register(obj);
        self.trailer.insert(r);
        r
    }

    /// The existing number of an object structurally equal to `candidate`,
    /// or a fresh one. Kinds without a structural key always register.
    pub fn find_or_register(&mut self, candidate: PdfObject) -> ObjRef {
        self.canonicalize(candidate, false)
    }

    /// Like [`Self::find_or_register`], marking a newly registered object
    /// as trailer-referenced.
    pub fn find_or_add_trailer_object(&mut self, candidate: PdfObject) -> ObjRef {
        self.canonicalize(candidate, true)
    }

    fn canonicalize(&mut self, candidate: PdfObject, trailer: bool) -> ObjRef {
        let Some(key) = candidate.structural_key() else {
            return if trailer {
                self.add_trailer_object(candidate)
            } else {
                self.register(candidate)
            };
        };
        if let Some(&existing) = self.canonical.get(&key) {
            log::debug!("Reusing {:?} object {}", candidate.kind(), existing);
            return existing;
        }
        let r = if trailer {
            self.add_trailer_object(candidate)
        } else {
            self.register(candidate)
        };
        self.canonical.insert(key, r);
        r
    }

    /// The number of an already registered object structurally equal to
    /// `candidate`.
    pub fn find(&self, candidate: &PdfObject) -> Option<ObjRef> {
        candidate
            .structural_key()
            .and_then(|key| self.canonical.get(&key).copied())
    }

    /// Defined objects of `kind`.
    pub fn count(&self, kind: ObjectKind) -> usize {
        self.slots
            .iter()
            .flatten()
            .filter(|obj| obj.kind() == kind)
            .count()
    }

    pub fn get(&self, r: ObjRef) -> Option<&PdfObject> {
        let index = r.number().checked_sub(1)?;
        self.slots.get(index as usize)?.as_ref()
    }

    pub fn get_mut(&mut self, r: ObjRef) -> Option<&mut PdfObject> {
        let index = r.number().checked_sub(1)?;
        self.slots.get_mut(index as usize)?.as_mut()
    }

    /// Defined objects in ascending number order.
    pub fn objects(&self) -> impl Iterator<Item = (ObjRef, &PdfObject)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|obj| (ObjRef::new(i as u32 + 1), obj)))
    }

    /// Reserved numbers that never received an object.
    pub fn undefined(&self) -> impl Iterator<Item = ObjRef> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(i, _)| ObjRef::new(i as u32 + 1))
    }

    pub fn trailer_objects(&self) -> impl Iterator<Item = ObjRef> + '_ {
        self.trailer.iter().copied()
    }

    pub fn is_trailer_object(&self, r: ObjRef) -> bool {
        self.trailer.contains(&r)
    }

    /// Numbers handed out so far, defined or not.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether `r` was handed out by this registry.
    pub fn contains(&self, r: ObjRef) -> bool {
        r.number() >= 1 && r.number() as usize <= self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::object::{nums, Action, Destination, Function, GoTo, Num, Pages};

    fn destination(name: &str, y: f64) -> PdfObject {
        PdfObject::Destination(Destination {
            name: name.to_string(),
            page: ObjRef::new(1),
            x: Num(0.0),
            y: Num(y),
        })
    }

    #[test]
    fn test_numbers_are_monotonic_across_registration_kinds() {
        let mut registry = ObjectRegistry::new();
        let a = registry.register(PdfObject::Pages(Pages::default()));
        let b = registry.add_trailer_object(PdfObject::Pages(Pages::default()));
        let c = registry.reserve();
        let d = registry.find_or_register(destination("x", 1.0));
        assert_eq!(
            [a, b, c, d].map(|r| r.number()),
            [1, 2, 3, 4]
        );
        assert!(registry.is_trailer_object(b));
        assert!(!registry.is_trailer_object(a));
        assert_eq!(registry.undefined().collect::<Vec<_>>(), vec![c]);
    }

    #[test]
    fn test_dedup_returns_same_reference() {
        let mut registry = ObjectRegistry::new();
        let first = registry.find_or_register(destination("intro", 700.0));
        let other = registry.find_or_register(destination("outro", 700.0));
        let again = registry.find_or_register(destination("intro", 700.0));
        assert_eq!(first, again);
        assert_ne!(first, other);
        assert_eq!(registry.count(ObjectKind::Destination), 2);
        assert_eq!(registry.find(&destination("outro", 700.0)), Some(other));
        assert_eq!(registry.find(&destination("nowhere", 0.0)), None);
    }

    #[test]
    fn test_dedup_is_order_independent() {
        let functions: Vec<PdfObject> = (0..3)
            .map(|i| {
                PdfObject::Function(Function::Exponential {
                    domain: nums(&[0.0, 1.0]),
                    range: None,
                    c0: nums(&[i as f64]),
                    c1: nums(&[1.0]),
                    n: Num(1.0),
                })
            })
            .collect();
        let mut forward = ObjectRegistry::new();
        let mut backward = ObjectRegistry::new();
        for f in functions.iter().chain(functions.iter()) {
            forward.find_or_register(f.clone());
        }
        for f in functions.iter().rev().chain(functions.iter()) {
            backward.find_or_register(f.clone());
        }
        assert_eq!(forward.count(ObjectKind::Function), 3);
        assert_eq!(backward.count(ObjectKind::Function), 3);
    }

    #[test]
    fn test_trailer_dedup_marks_only_new_objects() {
        let mut registry = ObjectRegistry::new();
        let goto = || {
            PdfObject::Action(Action::GoTo(GoTo {
                page: ObjRef::new(1),
                x: Num(0.0),
                y: Num(-0.0),
            }))
        };
        let a = registry.find_or_add_trailer_object(goto());
        let b = registry.find_or_add_trailer_object(goto());
        assert_eq!(a, b);
        assert_eq!(registry.trailer_objects().count(), 1);
    }

    #[test]
    fn test_define_rejects_second_assignment() {
        let mut registry = ObjectRegistry::new();
        let r = registry.reserve();
        registry.define(r, PdfObject::Pages(Pages::default())).unwrap();
        let err = registry.define(r, PdfObject::Pages(Pages::default())).unwrap_err();
        assert!(matches!(err, FolioError::DuplicateAssignment(x) if x == r));
        assert!(registry.define(ObjRef::new(7), PdfObject::Pages(Pages::default())).is_err());
    }

    #[test]
    fn test_non_dedup_kinds_always_register() {
        let mut registry = ObjectRegistry::new();
        let uri = || PdfObject::Action(Action::Uri("https://example.com".to_string()));
        let a = registry.find_or_register(uri());
        let b = registry.find_or_register(uri());
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
    }
}
