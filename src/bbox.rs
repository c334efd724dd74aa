use nalgebra::SVector;
use serde::{Deserialize, Serialize};

/// A bounding box in `tlbr` form: `(x1, y1, x2, y2)` with `x2 >= x1`, `y2 >= y1`.
///
/// This is the representation detections arrive in and the one IoU is
/// computed against; `tlwh` and `xyah` are derived views used by the track
/// entity and the Kalman filter respectively.
#[derive(Clone, Copy, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x_1: f64,
    pub y_1: f64,
    pub x_2: f64,
    pub y_2: f64,
}

/// The `tlwh` box representation: top-left corner plus width/height.
///
/// This is what a track reports to callers (§3/§6): it is what a
/// downstream consumer typically wants to draw or crop with.
#[derive(Clone, Copy, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tlwh {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl BBox {
    pub fn new(x_1: f64, y_1: f64, x_2: f64, y_2: f64) -> Self {
        BBox { x_1, y_1, x_2, y_2 }
    }

    pub fn from_tlwh(tlwh: Tlwh) -> Self {
        BBox {
            x_1: tlwh.x,
            y_1: tlwh.y,
            x_2: tlwh.x + tlwh.w,
            y_2: tlwh.y + tlwh.h,
        }
    }

    pub fn to_tlwh(&self) -> Tlwh {
        Tlwh {
            x: self.x_1,
            y: self.y_1,
            w: (self.x_2 - self.x_1).max(0.0),
            h: (self.y_2 - self.y_1).max(0.0),
        }
    }

    /// Converts to the filter's measurement space: `(center x, center y, aspect=w/h, height)`.
    pub fn to_xyah(&self) -> SVector<f64, 4> {
        let w = (self.x_2 - self.x_1).max(0.0);
        let h = (self.y_2 - self.y_1).max(0.0);
        let cx = self.x_1 + w / 2.0;
        let cy = self.y_1 + h / 2.0;
        let aspect = if h > 0.0 { w / h } else { 0.0 };

        SVector::<f64, 4>::new(cx, cy, aspect, h)
    }

    /// Recovers a `tlbr` box from an `xyah` vector, e.g. the filter's projected mean.
    pub fn from_xyah(xyah: SVector<f64, 4>) -> Self {
        let (cx, cy, aspect, h) = (xyah[0], xyah[1], xyah[2], xyah[3]);
        let w = aspect * h;

        BBox {
            x_1: cx - w / 2.0,
            y_1: cy - h / 2.0,
            x_2: cx + w / 2.0,
            y_2: cy + h / 2.0,
        }
    }

    pub fn area(&self) -> f64 {
        ((self.x_2 - self.x_1).max(0.0)) * ((self.y_2 - self.y_1).max(0.0))
    }

    /// Intersection-over-union against another `tlbr` box, in `[0, 1]`.
    pub fn iou(&self, other: &Self) -> f64 {
        let iwidth = (self.x_2.min(other.x_2) - self.x_1.max(other.x_1)).max(0.0);
        let iheight = (self.y_2.min(other.y_2) - self.y_1.max(other.y_1)).max(0.0);
        let iarea = iwidth * iheight;

        let union = self.area() + other.area() - iarea;
        if union <= 0.0 {
            return 0.0;
        }

        iarea / union
    }
}
