use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

#[derive(Debug, Default)]
pub struct ObjectIdAllocator {
    next: u64,
}

impl ObjectIdAllocator {
    pub fn allocate(&mut self) -> ObjectId {
        let id = ObjectId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

/// Axis-aligned box in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        let half_extents = half_extents.abs();
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Distance along `ray` at which it enters the box, or 0 when the origin is inside.
    pub fn ray_entry(&self, ray: &Ray) -> Option<f32> {
        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;

        for axis in 0..3 {
            let origin = ray.origin[axis];
            let direction = ray.direction[axis];
            if direction.abs() <= f32::EPSILON {
                if origin < self.min[axis] || origin > self.max[axis] {
                    return None;
                }
                continue;
            }
            let inv = direction.recip();
            let mut t0 = (self.min[axis] - origin) * inv;
            let mut t1 = (self.max[axis] - origin) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_enter = t_enter.max(t0);
            t_exit = t_exit.min(t1);
        }

        if t_exit < t_enter.max(0.0) {
            return None;
        }
        Some(t_enter.max(0.0))
    }
}

#[derive(Debug, Clone)]
pub struct Collider<T> {
    pub id: ObjectId,
    pub tag: T,
    pub bounds: Aabb,
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit<T> {
    pub object: ObjectId,
    pub tag: T,
    pub distance: f32,
}

/// Flat collider list tagged with a caller-defined category used for dispatch.
#[derive(Debug)]
pub struct CollisionWorld<T> {
    allocator: ObjectIdAllocator,
    colliders: Vec<Collider<T>>,
}

impl<T> Default for CollisionWorld<T> {
    fn default() -> Self {
        Self {
            allocator: ObjectIdAllocator::default(),
            colliders: Vec::new(),
        }
    }
}

impl<T: Copy> CollisionWorld<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: T, bounds: Aabb) -> ObjectId {
        let id = self.allocator.allocate();
        self.colliders.push(Collider {
            id,
            tag,
            bounds,
            enabled: true,
        });
        id
    }

    pub fn remove(&mut self, id: ObjectId) -> bool {
        let before = self.colliders.len();
        self.colliders.retain(|collider| collider.id != id);
        before != self.colliders.len()
    }

    pub fn set_bounds(&mut self, id: ObjectId, bounds: Aabb) -> bool {
        match self.find_mut(id) {
            Some(collider) => {
                collider.bounds = bounds;
                true
            }
            None => false,
        }
    }

    pub fn set_enabled(&mut self, id: ObjectId, enabled: bool) -> bool {
        match self.find_mut(id) {
            Some(collider) => {
                collider.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn find(&self, id: ObjectId) -> Option<&Collider<T>> {
        self.colliders.iter().find(|collider| collider.id == id)
    }

    fn find_mut(&mut self, id: ObjectId) -> Option<&mut Collider<T>> {
        self.colliders.iter_mut().find(|collider| collider.id == id)
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    /// Nearest enabled collider along `ray` within `max_distance`.
    /// On equal distance the most recently inserted collider wins.
    pub fn raycast(&self, ray: &Ray, max_distance: f32) -> Option<RayHit<T>> {
        let mut best: Option<RayHit<T>> = None;

        for collider in &self.colliders {
            if !collider.enabled {
                continue;
            }
            let Some(distance) = collider.bounds.ray_entry(ray) else {
                continue;
            };
            if distance > max_distance {
                continue;
            }
            match best {
                Some(hit) if hit.distance < distance => {}
                _ => {
                    best = Some(RayHit {
                        object: collider.id,
                        tag: collider.tag,
                        distance,
                    })
                }
            }
        }

        best
    }
}
