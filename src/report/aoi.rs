/// Data window of one plot panel, x is voltage and y is current or power
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AreaOfInterest {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl AreaOfInterest {
    /// Smallest window that holds every point and the origin
    pub fn enclosing<I: IntoIterator<Item = (f64, f64)>>(points: I) -> Self {
        let mut aoi = AreaOfInterest {
            min_x: 0.0,
            max_x: 0.0,
            min_y: 0.0,
            max_y: 0.0,
        };
        for (x, y) in points {
            aoi.min_x = aoi.min_x.min(x);
            aoi.max_x = aoi.max_x.max(x);
            aoi.min_y = aoi.min_y.min(y);
            aoi.max_y = aoi.max_y.max(y);
        }
        if aoi.max_x - aoi.min_x <= 0.0 {
            aoi.max_x = aoi.min_x + 1.0;
        }
        if aoi.max_y - aoi.min_y <= 0.0 {
            aoi.max_y = aoi.min_y + 1.0;
        }
        aoi
    }

    pub fn extended(&self) -> Self {
        let slack = 0.05;
        let x_range = self.max_x - self.min_x;
        let y_range = self.max_y - self.min_y;
        Self {
            min_x: self.min_x - x_range * slack,
            max_x: self.max_x + x_range * slack,
            min_y: self.min_y - y_range * slack,
            max_y: self.max_y + y_range * slack,
        }
    }
}
