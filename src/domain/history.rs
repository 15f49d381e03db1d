// Historical speed window domain model
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPoint {
    pub timestamp: DateTime<Utc>,
    pub speed: f64,
}

impl HistoryPoint {
    pub fn new(timestamp: DateTime<Utc>, speed: f64) -> Self {
        Self { timestamp, speed }
    }
}

/// Trailing window of speed readings, oldest first.
#[derive(Debug, Clone, Default)]
pub struct HistoryWindow {
    points: Vec<HistoryPoint>,
}

impl HistoryWindow {
    pub fn new(mut points: Vec<HistoryPoint>) -> Self {
        // The server answers newest first
        points.sort_by_key(|p| p.timestamp);
        Self { points }
    }

    #[cfg(test)]
    pub fn points(&self) -> &[HistoryPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&HistoryPoint> {
        self.points.first()
    }

    pub fn latest(&self) -> Option<&HistoryPoint> {
        self.points.last()
    }

    pub fn min_speed(&self) -> Option<f64> {
        self.points.iter().map(|p| p.speed).reduce(f64::min)
    }

    pub fn max_speed(&self) -> Option<f64> {
        self.points.iter().map(|p| p.speed).reduce(f64::max)
    }

    /// Downsample using bucket averaging
    pub fn downsample(&self, max_points: usize) -> Vec<HistoryPoint> {
        if max_points == 0 {
            return Vec::new();
        }
        if self.points.len() <= max_points {
            return self.points.clone();
        }

        let bucket_size = (self.points.len() as f64 / max_points as f64).ceil() as usize;
        let mut downsampled = Vec::with_capacity(max_points);

        for chunk in self.points.chunks(bucket_size) {
            // Middle point's timestamp, average value
            let mid_idx = chunk.len() / 2;
            let avg_speed = chunk.iter().map(|p| p.speed).sum::<f64>() / chunk.len() as f64;
            downsampled.push(HistoryPoint::new(chunk[mid_idx].timestamp, avg_speed));
        }

        downsampled
    }
}
