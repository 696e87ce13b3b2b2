pub mod hit;
pub mod scene;
pub mod surface;

pub use hit::{HitShape, hit_test, hit_test_edge};
pub use scene::{RetainedScene, SceneEdge, SceneEdgeHandle, SceneNode, SceneNodeHandle};
pub use surface::Surface;
