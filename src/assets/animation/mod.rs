//! Keyframe animations: channels route sampler output curves onto node
//! properties. This core resolves the references and leaves evaluation to
//! the consumer.

use crate::assets::accessor::Accessor;
use crate::assets::scene::Node;
use crate::utils::handle_storage::Handle;
use serde::Deserialize;

/// Which node property a channel drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetPath {
    Translation,
    Rotation,
    Scale,
    /// Morph-target weights.
    Weights,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub enum Interpolation {
    #[default]
    #[serde(rename = "LINEAR")]
    Linear,
    #[serde(rename = "STEP")]
    Step,
    #[serde(rename = "CUBICSPLINE")]
    CubicSpline,
}

/// A keyframe curve: input holds the timestamps, output the values.
pub struct AnimationSampler {
    pub input: Handle<Accessor>,
    pub output: Handle<Accessor>,
    pub interpolation: Interpolation,
}

/// Routes one sampler onto one node property. The sampler index is local to
/// the owning animation's `samplers` list and is bounds-checked at load.
pub struct Channel {
    pub sampler: usize,
    /// Absent when an extension supplies the target instead.
    pub target_node: Option<Handle<Node>>,
    pub target_path: TargetPath,
}

pub struct Animation {
    pub name: Option<String>,
    pub samplers: Vec<AnimationSampler>,
    pub channels: Vec<Channel>,
}

impl Animation {
    /// The sampler a channel routes from.
    pub fn sampler(&self, channel: &Channel) -> &AnimationSampler {
        // In-bounds by resolution invariant.
        &self.samplers[channel.sampler]
    }
}
