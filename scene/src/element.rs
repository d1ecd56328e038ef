use serde::{Deserialize, Serialize};

use crate::SceneError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub(crate) usize);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Group,
    Box {
        center: [f64; 3],
        half_extents: [f64; 3],
    },
    Polyline {
        points: Vec<[f64; 3]>,
    },
    Points {
        points: Vec<[f64; 3]>,
    },
}

impl Shape {
    /// Applies `map` to every geometric point of the shape.
    pub fn map_points(&mut self, map: &mut dyn FnMut([f64; 3]) -> [f64; 3]) {
        match self {
            Shape::Group => {}
            Shape::Box { center, .. } => *center = map(*center),
            Shape::Polyline { points } | Shape::Points { points } => {
                for point in points.iter_mut() {
                    *point = map(*point);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Appearance {
    pub color: [u8; 3],
    /// Percent, 0 = opaque.
    pub transparency: u8,
    pub line_width: f32,
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            color: [255, 255, 255],
            transparency: 0,
            line_width: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ElementNode {
    pub name: String,
    pub parent: Option<ElementId>,
    pub children: Vec<ElementId>,
    pub shape: Shape,
    pub appearance: Appearance,
}

/// Slab of visual elements addressed by handle. A node owns its subtree:
/// destroying it frees every index reachable from it.
#[derive(Debug, Default)]
pub struct ElementArena {
    nodes: Vec<Option<ElementNode>>,
    free: Vec<usize>,
    live: usize,
}

impl ElementArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.nodes.get(id.0).map(Option::is_some).unwrap_or(false)
    }

    pub fn node(&self, id: ElementId) -> Option<&ElementNode> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn node_mut(&mut self, id: ElementId) -> Option<&mut ElementNode> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn create(
        &mut self,
        name: impl Into<String>,
        shape: Shape,
        appearance: Appearance,
    ) -> ElementId {
        self.insert(ElementNode {
            name: name.into(),
            parent: None,
            children: Vec::new(),
            shape,
            appearance,
        })
    }

    pub fn create_child(
        &mut self,
        parent: ElementId,
        name: impl Into<String>,
        shape: Shape,
        appearance: Appearance,
    ) -> Result<ElementId, SceneError> {
        if !self.contains(parent) {
            return Err(SceneError::UnknownElement);
        }
        let child = self.insert(ElementNode {
            name: name.into(),
            parent: Some(parent),
            children: Vec::new(),
            shape,
            appearance,
        });
        self.nodes[parent.0]
            .as_mut()
            .expect("parent checked above")
            .children
            .push(child);
        Ok(child)
    }

    /// Frees `id` and every element below it. Detaches from the parent's
    /// child list when the node is not a root.
    pub fn destroy(&mut self, id: ElementId) -> Result<(), SceneError> {
        let parent = self.node(id).ok_or(SceneError::UnknownElement)?.parent;
        if let Some(parent) = parent {
            if let Some(node) = self.node_mut(parent) {
                node.children.retain(|child| *child != id);
            }
        }
        self.free_subtree(id);
        Ok(())
    }

    pub fn subtree(&self, root: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.node(id) {
                out.push(id);
                stack.extend(node.children.iter().copied());
            }
        }
        out
    }

    /// Copies the subtree under `root` into `dest`, passing every shape
    /// point through `map`. Returns the new root handle.
    pub fn copy_subtree_with(
        &self,
        root: ElementId,
        dest: &mut ElementArena,
        map: &mut dyn FnMut([f64; 3]) -> [f64; 3],
    ) -> Result<ElementId, SceneError> {
        let node = self.node(root).ok_or(SceneError::UnknownElement)?;
        let mut shape = node.shape.clone();
        shape.map_points(map);
        let copy = dest.create(node.name.clone(), shape, node.appearance);
        for child in node.children.clone() {
            let copied_child = self.copy_subtree_with(child, dest, map)?;
            dest.nodes[copied_child.0]
                .as_mut()
                .expect("child created above")
                .parent = Some(copy);
            dest.nodes[copy.0]
                .as_mut()
                .expect("copy created above")
                .children
                .push(copied_child);
        }
        Ok(copy)
    }

    fn insert(&mut self, node: ElementNode) -> ElementId {
        self.live += 1;
        match self.free.pop() {
            Some(index) => {
                self.nodes[index] = Some(node);
                ElementId(index)
            }
            None => {
                self.nodes.push(Some(node));
                ElementId(self.nodes.len() - 1)
            }
        }
    }

    fn free_subtree(&mut self, id: ElementId) {
        let Some(node) = self.nodes.get_mut(id.0).and_then(Option::take) else {
            return;
        };
        self.live -= 1;
        self.free.push(id.0);
        for child in node.children {
            self.free_subtree(child);
        }
    }
}
