//! Services: named, fixed tables of method descriptors.

use super::method::Method;

#[derive(Debug, Clone, Copy)]
pub struct Service<'o> {
    id: u32,
    name: &'static str,
    methods: &'o [Method<'o>],
}

impl<'o> Service<'o> {
    pub const fn new(id: u32, name: &'static str, methods: &'o [Method<'o>]) -> Self {
        Self { id, name, methods }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn methods(&self) -> &'o [Method<'o>] {
        self.methods
    }

    /// Look up a method by id.
    pub fn method(&self, id: u32) -> Option<&'o Method<'o>> {
        self.methods.iter().find(|m| m.id() == id)
    }
}
