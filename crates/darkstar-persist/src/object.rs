//! The persisted object trait.

use std::any::Any;
use std::fmt;

use darkstar_common::MemStream;

use crate::Result;

/// Type-erasure helpers, implemented for every `'static` type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// An object that can rebuild itself from a persisted stream.
///
/// `read` is called with the stream positioned just after the chunk header
/// (and, for `PERS` chunks, after the class name and version). The object
/// may consume less than its chunk; the caller realigns afterwards.
pub trait PersistObject: AsAny + fmt::Debug + Send + Sync {
    /// Name this type is registered under, or a descriptive name for
    /// tag-registered types.
    fn class_name(&self) -> &'static str;

    /// Populate `self` from the stream.
    fn read(&mut self, stream: &mut MemStream<&[u8]>, version: u32) -> Result<()>;
}

impl dyn PersistObject {
    /// Check whether the concrete type is `T`.
    pub fn is<T: PersistObject>(&self) -> bool {
        <dyn PersistObject as AsAny>::as_any(self).is::<T>()
    }

    /// Borrow as the concrete type `T`.
    pub fn downcast_ref<T: PersistObject>(&self) -> Option<&T> {
        <dyn PersistObject as AsAny>::as_any(self).downcast_ref()
    }

    /// Mutably borrow as the concrete type `T`.
    pub fn downcast_mut<T: PersistObject>(&mut self) -> Option<&mut T> {
        <dyn PersistObject as AsAny>::as_any_mut(self).downcast_mut()
    }

    /// Take ownership as the concrete type `T`, handing the object back on
    /// mismatch.
    pub fn downcast<T: PersistObject>(self: Box<Self>) -> std::result::Result<Box<T>, Box<Self>> {
        if self.is::<T>() {
            match <dyn PersistObject as AsAny>::into_any(self).downcast::<T>() {
                Ok(object) => Ok(object),
                Err(_) => unreachable!("type checked above"),
            }
        } else {
            Err(self)
        }
    }
}
