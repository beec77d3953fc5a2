//! Ordered object lists with lookup by identity.

use indexmap::IndexMap;
use log::debug;

use spine_core::{ObjectError, ObjectId};

use crate::object::{OutObject, Variant};

/// Ordered objects of one variant, addressed by [`ObjectId`].
///
/// Objects with an unassigned id may be held but cannot be looked up.
/// Two objects with the same assigned id are rejected. Lookup is by
/// identity only; field values never take part in it.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectList<V: Variant> {
    objects: Vec<OutObject<V>>,
    by_id: IndexMap<ObjectId, usize>,
}

impl<V: Variant> Default for ObjectList<V> {
    fn default() -> Self {
        Self {
            objects: Vec::new(),
            by_id: IndexMap::new(),
        }
    }
}

impl<V: Variant> ObjectList<V> {
    /// An empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list, rejecting duplicate assigned ids.
    pub fn from_objects(objects: impl IntoIterator<Item = OutObject<V>>) -> Result<Self, ObjectError> {
        let mut list = Self::new();
        for obj in objects {
            list.push(obj)?;
        }
        Ok(list)
    }

    /// Append an object.
    pub fn push(&mut self, object: OutObject<V>) -> Result<(), ObjectError> {
        let id = object.id();
        if id.is_assigned() {
            if self.by_id.contains_key(&id) {
                return Err(ObjectError::invalid_state(
                    "id",
                    format!("{} {id} is already in the list", V::NAME),
                ));
            }
            self.by_id.insert(id, self.objects.len());
        }
        self.objects.push(object);
        Ok(())
    }

    /// The object with identity `id`.
    pub fn get(&self, id: ObjectId) -> Option<&OutObject<V>> {
        self.by_id.get(&id).map(|&i| &self.objects[i])
    }

    /// Run `f` on the object with identity `id` and return its result.
    ///
    /// If `f` changes the object's id the list is re-indexed under the new
    /// one; an unassigned id drops it from lookup. A new id already held
    /// by another object is reverted and reported as
    /// [`ObjectError::InvalidState`], leaving `f`'s other changes in place.
    pub fn update<R>(
        &mut self,
        id: ObjectId,
        f: impl FnOnce(&mut OutObject<V>) -> R,
    ) -> Result<R, ObjectError> {
        let name = V::NAME;
        let i = *self.by_id.get(&id).ok_or_else(|| {
            ObjectError::invalid_state("id", format!("no {name} with id {id} in the list"))
        })?;
        let obj = &mut self.objects[i];
        let out = f(obj);
        let new_id = obj.id();
        if new_id != id {
            if new_id.is_assigned() && self.by_id.contains_key(&new_id) {
                obj.base_mut().id = id;
                return Err(ObjectError::invalid_state(
                    "id",
                    format!("{name} {new_id} is already in the list"),
                ));
            }
            self.by_id.swap_remove(&id);
            if new_id.is_assigned() {
                self.by_id.insert(new_id, i);
            }
            debug!("re-indexed {name} {id} as {new_id}");
        }
        Ok(out)
    }

    /// Whether an object with identity `id` is held.
    pub fn contains(&self, id: ObjectId) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Assigned ids in list order.
    pub fn ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects.iter().map(OutObject::id).filter(|id| id.is_assigned())
    }

    /// Objects in list order.
    pub fn iter(&self) -> std::slice::Iter<'_, OutObject<V>> {
        self.objects.iter()
    }

    /// Number of objects, including unassigned ones.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Record the matching result of the object with identity `id`.
    ///
    /// Callers must run one matching pass per list; this takes `&mut self`
    /// so concurrent writers are already excluded by the borrow checker.
    pub fn set_matches(
        &mut self,
        id: ObjectId,
        match_ids: Vec<ObjectId>,
        overlaps: Vec<f32>,
    ) -> Result<(), ObjectError> {
        self.update(id, |obj| obj.base_mut().set_matches(match_ids, overlaps))?
    }

    /// Forget every match in the list.
    pub fn clear_matches(&mut self) {
        for obj in &mut self.objects {
            obj.base_mut().clear_matches();
        }
        debug!("cleared matches of {} {} objects", self.objects.len(), V::NAME);
    }

    /// Consume the list, returning the objects in order.
    pub fn into_vec(self) -> Vec<OutObject<V>> {
        self.objects
    }
}

impl<'a, V: Variant> IntoIterator for &'a ObjectList<V> {
    type Item = &'a OutObject<V>;
    type IntoIter = std::slice::Iter<'a, OutObject<V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.objects.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{RecoObject, TruthObject};

    fn with_id(id: i64) -> RecoObject {
        let mut obj = RecoObject::new();
        obj.base_mut().id = ObjectId(id);
        obj
    }

    #[test]
    fn lookup_is_by_identity() {
        let mut a = with_id(0);
        a.base_mut().index = Some(vec![1, 2]);
        let mut b = with_id(1);
        b.base_mut().index = Some(vec![1, 2]);
        let list = ObjectList::from_objects([a, b]).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.get(ObjectId(1)).unwrap().id(), ObjectId(1));
        assert!(list.get(ObjectId(7)).is_none());
        assert_eq!(list.ids().collect::<Vec<_>>(), vec![ObjectId(0), ObjectId(1)]);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut list = ObjectList::new();
        list.push(with_id(3)).unwrap();
        assert!(matches!(
            list.push(with_id(3)),
            Err(ObjectError::InvalidState { .. })
        ));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn unassigned_objects_are_held_but_not_indexed() {
        let mut list = ObjectList::new();
        list.push(RecoObject::new()).unwrap();
        list.push(RecoObject::new()).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.ids().count(), 0);
        assert!(!list.contains(ObjectId::UNASSIGNED));
    }

    #[test]
    fn matching_pass_updates_by_id() {
        let mut list: ObjectList<crate::TruthExt> = ObjectList::new();
        let mut t = TruthObject::new();
        t.base_mut().id = ObjectId(5);
        list.push(t).unwrap();

        list.set_matches(ObjectId(5), vec![ObjectId(0), ObjectId(2)], vec![0.9, 0.1])
            .unwrap();
        let obj = list.get(ObjectId(5)).unwrap();
        assert!(obj.base().is_matched());
        assert_eq!(obj.base().match_overlaps(), &[0.9, 0.1]);

        assert!(list
            .set_matches(ObjectId(5), vec![ObjectId(0)], vec![])
            .is_err());
        assert!(list.set_matches(ObjectId(6), vec![], vec![]).is_err());

        list.clear_matches();
        assert!(!list.get(ObjectId(5)).unwrap().base().is_matched());
    }

    #[test]
    fn id_change_reindexes() {
        let mut list = ObjectList::from_objects([with_id(0), with_id(1), with_id(2)]).unwrap();
        let size = list
            .update(ObjectId(0), |obj| {
                obj.base_mut().id = ObjectId(9);
                obj.base_mut().index = Some(vec![4, 5]);
                obj.base().size()
            })
            .unwrap();
        assert_eq!(size, Ok(2));
        assert!(!list.contains(ObjectId(0)));
        assert_eq!(list.get(ObjectId(9)).unwrap().base().index.as_deref(), Some(&[4, 5][..]));
        assert_eq!(list.get(ObjectId(2)).unwrap().id(), ObjectId(2));
        assert_eq!(
            list.ids().collect::<Vec<_>>(),
            vec![ObjectId(9), ObjectId(1), ObjectId(2)]
        );

        list.update(ObjectId(1), |obj| obj.base_mut().id = ObjectId::UNASSIGNED)
            .unwrap();
        assert!(!list.contains(ObjectId(1)));
        assert_eq!(list.len(), 3);
        assert_eq!(list.ids().count(), 2);
    }

    #[test]
    fn id_change_to_held_id_is_reverted() {
        let mut list = ObjectList::from_objects([with_id(0), with_id(1)]).unwrap();
        let err = list
            .update(ObjectId(0), |obj| obj.base_mut().id = ObjectId(1))
            .unwrap_err();
        assert!(matches!(err, ObjectError::InvalidState { .. }));
        assert_eq!(list.get(ObjectId(0)).unwrap().id(), ObjectId(0));
        assert_eq!(list.get(ObjectId(1)).unwrap().id(), ObjectId(1));
        assert!(list.update(ObjectId(7), |_| ()).is_err());
    }
}
