use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use geometry::PlaneId;
use serde::{Deserialize, Serialize};

pub mod element;
pub use element::{Appearance, ElementArena, ElementId, ElementNode, Shape};

#[derive(thiserror::Error, Debug)]
pub enum SceneError {
    #[error("element handle is not live in this arena")]
    UnknownElement,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneLayout {
    Single,
    PerPlane,
}

#[derive(Debug)]
enum SceneParts {
    Single(Vec<ElementId>),
    PerPlane(BTreeMap<PlaneId, Vec<ElementId>>),
}

/// Named, persistent container of visual elements. The scene outlives any
/// event; its contents are torn down and rebuilt wholesale each event.
#[derive(Debug)]
pub struct Scene {
    pub name: String,
    pub arena: ElementArena,
    parts: SceneParts,
}

impl Scene {
    pub fn new_single(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arena: ElementArena::new(),
            parts: SceneParts::Single(Vec::new()),
        }
    }

    pub fn new_per_plane(
        name: impl Into<String>,
        planes: impl IntoIterator<Item = PlaneId>,
    ) -> Self {
        Self {
            name: name.into(),
            arena: ElementArena::new(),
            parts: SceneParts::PerPlane(
                planes.into_iter().map(|plane| (plane, Vec::new())).collect(),
            ),
        }
    }

    pub fn layout(&self) -> SceneLayout {
        match self.parts {
            SceneParts::Single(_) => SceneLayout::Single,
            SceneParts::PerPlane(_) => SceneLayout::PerPlane,
        }
    }

    pub fn planes(&self) -> Vec<PlaneId> {
        match &self.parts {
            SceneParts::Single(_) => Vec::new(),
            SceneParts::PerPlane(parts) => parts.keys().copied().collect(),
        }
    }

    pub fn roots(&self) -> &[ElementId] {
        match &self.parts {
            SceneParts::Single(roots) => roots,
            SceneParts::PerPlane(_) => &[],
        }
    }

    pub fn plane_roots(&self, plane: PlaneId) -> Option<&[ElementId]> {
        match &self.parts {
            SceneParts::Single(_) => None,
            SceneParts::PerPlane(parts) => parts.get(&plane).map(Vec::as_slice),
        }
    }

    pub fn add_root(&mut self, id: ElementId) {
        match &mut self.parts {
            SceneParts::Single(roots) => roots.push(id),
            SceneParts::PerPlane(_) => {}
        }
    }

    /// Routes an element into one plane's sub-container. Returns false, and
    /// leaves the scene untouched, when the plane is not part of this scene.
    pub fn add_plane_root(&mut self, plane: PlaneId, id: ElementId) -> bool {
        match &mut self.parts {
            SceneParts::Single(_) => false,
            SceneParts::PerPlane(parts) => match parts.get_mut(&plane) {
                Some(roots) => {
                    roots.push(id);
                    true
                }
                None => false,
            },
        }
    }

    /// Full teardown of the previous event's contents. The plane partition
    /// survives; every element tree is freed.
    pub fn clear_contents(&mut self) {
        let roots: Vec<ElementId> = match &mut self.parts {
            SceneParts::Single(roots) => std::mem::take(roots),
            SceneParts::PerPlane(parts) => {
                parts.values_mut().flat_map(std::mem::take).collect()
            }
        };
        for root in roots {
            let _ = self.arena.destroy(root);
        }
    }

    pub fn element_count(&self) -> usize {
        self.arena.len()
    }

    pub fn snapshot(&self) -> SceneSnapshot {
        let parts = match &self.parts {
            SceneParts::Single(roots) => vec![SnapshotPart {
                plane: None,
                elements: roots
                    .iter()
                    .filter_map(|root| snapshot_node(&self.arena, *root))
                    .collect(),
            }],
            SceneParts::PerPlane(parts) => parts
                .iter()
                .map(|(plane, roots)| SnapshotPart {
                    plane: Some(*plane),
                    elements: roots
                        .iter()
                        .filter_map(|root| snapshot_node(&self.arena, *root))
                        .collect(),
                })
                .collect(),
        };
        SceneSnapshot {
            scene: self.name.clone(),
            parts,
        }
    }

    pub fn save_snapshot<P: AsRef<Path>>(&self, path: P) -> Result<(), SceneError> {
        let data = serde_json::to_vec_pretty(&self.snapshot())?;
        fs::write(path, data)?;
        Ok(())
    }
}

/// Serialized view of a scene's element trees, for offline inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub scene: String,
    pub parts: Vec<SnapshotPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotPart {
    pub plane: Option<PlaneId>,
    pub elements: Vec<SnapshotNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub name: String,
    pub shape: Shape,
    pub appearance: Appearance,
    pub children: Vec<SnapshotNode>,
}

fn snapshot_node(arena: &ElementArena, id: ElementId) -> Option<SnapshotNode> {
    let node = arena.node(id)?;
    Some(SnapshotNode {
        name: node.name.clone(),
        shape: node.shape.clone(),
        appearance: node.appearance,
        children: node
            .children
            .iter()
            .filter_map(|child| snapshot_node(arena, *child))
            .collect(),
    })
}
