//! Parent/child relations between entities.
//!
//! Relations are stored as [`Parent`] and [`Children`] components keyed by
//! `hecs::Entity`, so the hierarchy never owns entities and can be walked
//! without pointer chasing. Editor code reads the tree through
//! [`build_tree`] and defers mutations through [`HierarchyEdits`], which keeps
//! world borrows out of the traversal.

use hecs::{Entity, World};

use crate::error::HierarchyError;
use crate::scene::components::{Children, Name, Parent};
use crate::scene::Transform;

/// Makes `child` the last child of `parent`, detaching it from any previous
/// parent first. Both entities need a [`Transform`].
pub fn attach(world: &mut World, parent: Entity, child: Entity) -> Result<(), HierarchyError> {
    if parent == child {
        return Err(HierarchyError::SelfParent(child));
    }
    for entity in [parent, child] {
        if !world.contains(entity) {
            return Err(HierarchyError::NoSuchEntity(entity));
        }
        if !world.satisfies::<&Transform>(entity).unwrap_or(false) {
            return Err(HierarchyError::NoTransform(entity));
        }
    }
    if is_ancestor(world, child, parent) {
        return Err(HierarchyError::Cycle { parent, child });
    }

    detach(world, child)?;

    let pushed = match world.get::<&mut Children>(parent) {
        Ok(mut children) => {
            children.0.push(child);
            true
        }
        Err(_) => false,
    };
    if !pushed {
        world
            .insert_one(parent, Children(vec![child]))
            .map_err(|_| HierarchyError::NoSuchEntity(parent))?;
    }
    world
        .insert_one(child, Parent(parent))
        .map_err(|_| HierarchyError::NoSuchEntity(child))?;

    log::trace!("Attached {:?} under {:?}", child, parent);
    Ok(())
}

/// Turns `child` into a root. Detaching a root is a no-op.
pub fn detach(world: &mut World, child: Entity) -> Result<(), HierarchyError> {
    if !world.contains(child) {
        return Err(HierarchyError::NoSuchEntity(child));
    }

    if let Ok(Parent(parent)) = world.remove_one::<Parent>(child) {
        if let Ok(mut children) = world.get::<&mut Children>(parent) {
            children.0.retain(|&e| e != child);
        }
        log::trace!("Detached {:?} from {:?}", child, parent);
    }
    Ok(())
}

/// Despawns `entity` and every descendant.
pub fn despawn_recursive(world: &mut World, entity: Entity) -> Result<(), HierarchyError> {
    detach(world, entity)?;

    let mut stack = vec![entity];
    let mut doomed = Vec::new();
    while let Some(current) = stack.pop() {
        doomed.push(current);
        stack.extend(children_of(world, current));
    }

    for e in doomed {
        // Already-missing descendants are fine here.
        let _ = world.despawn(e);
    }
    Ok(())
}

/// True if `ancestor` is `entity` or lies on its parent chain.
pub fn is_ancestor(world: &World, ancestor: Entity, entity: Entity) -> bool {
    let mut current = Some(entity);
    // Bound the walk in case the components were edited into a loop by hand.
    let mut steps = world.len() as usize + 1;

    while let Some(e) = current {
        if e == ancestor {
            return true;
        }
        if steps == 0 {
            log::error!("Parent chain of {:?} does not terminate", entity);
            return true;
        }
        steps -= 1;
        current = world.get::<&Parent>(e).ok().map(|p| p.0);
    }
    false
}

pub fn parent_of(world: &World, entity: Entity) -> Option<Entity> {
    world.get::<&Parent>(entity).ok().map(|p| p.0)
}

pub fn children_of(world: &World, entity: Entity) -> Vec<Entity> {
    world
        .get::<&Children>(entity)
        .map(|c| c.0.clone())
        .unwrap_or_default()
}

/// Entities with a [`Transform`] and no parent, ordered by entity id so the
/// result is stable across frames.
pub fn roots(world: &World) -> Vec<Entity> {
    let mut roots: Vec<Entity> = world
        .query::<&Transform>()
        .without::<&Parent>()
        .iter()
        .map(|(entity, _)| entity)
        .collect();
    roots.sort_by_key(|e| e.id());
    roots
}

/// One row of the hierarchy panel.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub entity: Entity,
    /// `"{name}##{index}"`, unique per row so identically named entities
    /// do not collide in an immediate-mode UI.
    pub label: String,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn name(&self) -> &str {
        self.label.split("##").next().unwrap_or_default()
    }
}

/// Read-only pass producing the display model; rows are numbered in
/// depth-first pre-order.
pub fn build_tree(world: &World) -> Vec<TreeNode> {
    let mut index = 0;
    roots(world)
        .into_iter()
        .map(|root| build_node(world, root, &mut index))
        .collect()
}

fn build_node(world: &World, entity: Entity, index: &mut usize) -> TreeNode {
    let name = world
        .get::<&Name>(entity)
        .map(|n| n.0.clone())
        .unwrap_or_else(|_| format!("Entity {}", entity.id()));
    let label = format!("{name}##{index}");
    *index += 1;

    let children = children_of(world, entity)
        .into_iter()
        .map(|child| build_node(world, child, index))
        .collect();

    TreeNode {
        entity,
        label,
        children,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyEdit {
    Attach { parent: Entity, child: Entity },
    Detach(Entity),
    Despawn(Entity),
}

/// Mutations requested while the tree is being displayed.
#[derive(Debug, Default)]
pub struct HierarchyEdits {
    queue: Vec<HierarchyEdit>,
}

impl HierarchyEdits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, parent: Entity, child: Entity) {
        self.queue.push(HierarchyEdit::Attach { parent, child });
    }

    pub fn detach(&mut self, child: Entity) {
        self.queue.push(HierarchyEdit::Detach(child));
    }

    pub fn despawn(&mut self, entity: Entity) {
        self.queue.push(HierarchyEdit::Despawn(entity));
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Applies every queued edit in order. A failing edit is logged and
    /// skipped; the first failure is returned once the queue is drained.
    pub fn apply(&mut self, world: &mut World) -> Result<(), HierarchyError> {
        let mut first_error = None;

        for edit in self.queue.drain(..) {
            let result = match edit {
                HierarchyEdit::Attach { parent, child } => attach(world, parent, child),
                HierarchyEdit::Detach(child) => detach(world, child),
                HierarchyEdit::Despawn(entity) => despawn_recursive(world, entity),
            };
            if let Err(err) = result {
                log::warn!("Skipping hierarchy edit {:?}: {}", edit, err);
                first_error.get_or_insert(err);
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn_named(world: &mut World, name: &str) -> Entity {
        world.spawn((Name::new(name), Transform::IDENTITY))
    }

    #[test]
    fn attach_links_both_sides() {
        let mut world = World::new();
        let parent = spawn_named(&mut world, "Container");
        let child = spawn_named(&mut world, "Block");

        attach(&mut world, parent, child).unwrap();

        assert_eq!(parent_of(&world, child), Some(parent));
        assert_eq!(children_of(&world, parent), vec![child]);
        assert_eq!(roots(&world), vec![parent]);
    }

    #[test]
    fn reattach_moves_child_between_parents() {
        let mut world = World::new();
        let a = spawn_named(&mut world, "A");
        let b = spawn_named(&mut world, "B");
        let c = spawn_named(&mut world, "C");

        attach(&mut world, a, c).unwrap();
        attach(&mut world, b, c).unwrap();

        assert!(children_of(&world, a).is_empty());
        assert_eq!(children_of(&world, b), vec![c]);
    }

    #[test]
    fn cycles_and_self_parenting_are_rejected() {
        let mut world = World::new();
        let a = spawn_named(&mut world, "A");
        let b = spawn_named(&mut world, "B");
        let c = spawn_named(&mut world, "C");
        attach(&mut world, a, b).unwrap();
        attach(&mut world, b, c).unwrap();

        assert_eq!(
            attach(&mut world, c, a),
            Err(HierarchyError::Cycle {
                parent: c,
                child: a
            })
        );
        assert_eq!(attach(&mut world, b, b), Err(HierarchyError::SelfParent(b)));
        // Nothing changed
        assert_eq!(parent_of(&world, a), None);
    }

    #[test]
    fn entities_without_transform_cannot_be_linked() {
        let mut world = World::new();
        let folder = world.spawn((Name::new("Folder"),));
        let block = spawn_named(&mut world, "Block");

        assert_eq!(attach(&mut world, folder, block), Err(HierarchyError::NoTransform(folder)));
        assert_eq!(attach(&mut world, block, folder), Err(HierarchyError::NoTransform(folder)));
        assert_eq!(parent_of(&world, block), None);
        assert_eq!(roots(&world), vec![block]);
    }

    #[test]
    fn tree_is_numbered_in_pre_order_with_child_order_kept() {
        let mut world = World::new();
        let root = spawn_named(&mut world, "Container");
        let first = spawn_named(&mut world, "Gen Block");
        let second = spawn_named(&mut world, "Gen Block");
        let grandchild = spawn_named(&mut world, "Leaf");
        attach(&mut world, root, first).unwrap();
        attach(&mut world, root, second).unwrap();
        attach(&mut world, first, grandchild).unwrap();

        let tree = build_tree(&world);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].label, "Container##0");
        assert_eq!(tree[0].children[0].label, "Gen Block##1");
        assert_eq!(tree[0].children[0].children[0].label, "Leaf##2");
        assert_eq!(tree[0].children[1].label, "Gen Block##3");
        assert_eq!(tree[0].children[1].name(), "Gen Block");
        assert_eq!(tree[0].children[1].entity, second);
    }

    #[test]
    fn queued_edits_apply_after_traversal() {
        let mut world = World::new();
        let root = spawn_named(&mut world, "Root");
        let child = spawn_named(&mut world, "Child");
        let leaf = spawn_named(&mut world, "Leaf");
        attach(&mut world, child, leaf).unwrap();

        let mut edits = HierarchyEdits::new();
        for node in build_tree(&world) {
            if node.entity == child {
                edits.attach(root, child);
            }
        }
        edits.attach(leaf, root); // creates a cycle once child is under root
        assert_eq!(edits.len(), 2);

        let result = edits.apply(&mut world);
        assert!(matches!(result, Err(HierarchyError::Cycle { .. })));
        assert!(edits.is_empty());
        assert_eq!(parent_of(&world, child), Some(root));
        assert_eq!(parent_of(&world, root), None);
    }

    #[test]
    fn despawn_removes_descendants() {
        let mut world = World::new();
        let root = spawn_named(&mut world, "Root");
        let child = spawn_named(&mut world, "Child");
        let leaf = spawn_named(&mut world, "Leaf");
        attach(&mut world, root, child).unwrap();
        attach(&mut world, child, leaf).unwrap();

        despawn_recursive(&mut world, child).unwrap();

        assert!(world.contains(root));
        assert!(!world.contains(child));
        assert!(!world.contains(leaf));
        assert!(children_of(&world, root).is_empty());
    }
}
