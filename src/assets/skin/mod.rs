//! Skins bind a node hierarchy to mesh joints.

use crate::assets::accessor::Accessor;
use crate::assets::scene::Node;
use crate::utils::handle_storage::Handle;

pub struct Skin {
    pub name: Option<String>,
    /// MAT4 float accessor, one matrix per joint; absent means every
    /// inverse bind matrix is identity.
    pub inverse_bind_matrices: Option<Handle<Accessor>>,
    /// Closest common ancestor of the joints, when the exporter recorded it.
    pub skeleton: Option<Handle<Node>>,
    /// Never empty; resolution rejects a joint-less skin.
    pub joints: Vec<Handle<Node>>,
}
