use crate::scene::components::{Children, GlobalTransform};
use crate::scene::hierarchy;
use crate::scene::transform::Transform;
use hecs::World;

/// Writes a [`GlobalTransform`] for every entity reachable from a root.
pub(crate) fn propagate_transforms(world: &mut World) {
    let roots = hierarchy::roots(world);

    log::trace!("Propagating transforms from {} root entities", roots.len());

    let mut stack: Vec<(hecs::Entity, Transform)> = Vec::new();
    let mut pending_inserts: Vec<(hecs::Entity, Transform)> = Vec::new();

    for root in roots {
        stack.push((root, Transform::IDENTITY));

        while let Some((entity, parent_global)) = stack.pop() {
            let local = match world.get::<&Transform>(entity) {
                Ok(t) => *t,
                Err(_) => {
                    log::trace!("Entity {:?} has no Transform, skipping", entity);
                    continue;
                }
            };

            let global = parent_global.mul_transform(&local);

            match world.get::<&mut GlobalTransform>(entity) {
                Ok(mut existing) => existing.0 = global,
                Err(_) => pending_inserts.push((entity, global)),
            }

            if let Ok(children) = world.get::<&Children>(entity) {
                for &child in children.0.iter().rev() {
                    stack.push((child, global));
                }
            }
        }
    }

    for (entity, global) in pending_inserts {
        if let Err(e) = world.insert_one(entity, GlobalTransform(global)) {
            log::error!(
                "Failed to insert GlobalTransform for entity {:?}: {:?}",
                entity,
                e
            );
        }
    }
}
