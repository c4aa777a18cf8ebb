pub mod accessor;
pub mod animation;
pub mod buffer;
pub mod buffer_view;
pub mod camera;
pub mod image;
pub mod material;
pub mod mesh;
pub mod scene;
pub mod skin;
pub mod texture;
