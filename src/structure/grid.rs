//! Dense occupancy counter grid for a cubic world

/// D×D×D grid counting how many bricks cover each voxel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyGrid {
    dim: usize,
    data: Vec<u16>,
}

impl OccupancyGrid {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            data: vec![0; dim * dim * dim],
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    fn index(&self, x: usize, y: usize, z: usize) -> Option<usize> {
        if x < self.dim && y < self.dim && z < self.dim {
            Some((z * self.dim + x) * self.dim + y)
        } else {
            None
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<u16> {
        self.index(x, y, z).map(|i| self.data[i])
    }

    /// Occupancy count, treating cells outside the world as empty
    #[inline]
    pub fn count(&self, x: usize, y: usize, z: usize) -> u16 {
        self.get(x, y, z).unwrap_or(0)
    }

    /// Increment a cell; cells outside the world are ignored
    #[inline]
    pub fn increment(&mut self, x: usize, y: usize, z: usize) {
        if let Some(i) = self.index(x, y, z) {
            self.data[i] = self.data[i].saturating_add(1);
        }
    }

    /// True if any cell in `cells` on layer `z` is occupied
    pub fn any_occupied(&self, cells: impl IntoIterator<Item = (usize, usize)>, z: usize) -> bool {
        cells.into_iter().any(|(x, y)| self.count(x, y, z) > 0)
    }

    /// True if any cell has more than `limit` occupants
    pub fn any_above(&self, limit: u16) -> bool {
        self.data.iter().any(|&c| c > limit)
    }

    /// Number of occupied cells
    pub fn occupied_cells(&self) -> usize {
        self.data.iter().filter(|&&c| c > 0).count()
    }
}
