/// Summary statistics over a raw frame, logged per frame for bring-up and
/// debugging of the sensor link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    pub min: u16,
    pub max: u16,
    pub mean: f32,
    pub peak_pos: usize,
}

impl FrameStats {
    pub fn from_raw(frame: &[u16]) -> Option<Self> {
        if frame.is_empty() {
            return None;
        }

        let mut sum: u64 = 0;
        let mut min = frame[0];
        let mut max = frame[0];
        let mut peak_pos = 0;

        for (i, &v) in frame.iter().enumerate() {
            sum += v as u64;
            if v < min {
                min = v;
            }
            if v > max {
                max = v;
                peak_pos = i;
            }
        }

        Some(Self {
            min,
            max,
            mean: sum as f32 / frame.len() as f32,
            peak_pos,
        })
    }
}
