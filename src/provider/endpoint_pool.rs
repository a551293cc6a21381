use serde::Serialize;
use tracing::info;
use url::Url;

use crate::error::Error;

/// One upstream JSON-RPC source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub name: String,
    pub url: Url,
}

impl Endpoint {
    /// Names the endpoint after its host so credentials in the path never
    /// reach logs or the health payload.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let url = Url::parse(raw.trim())?;
        let name = url.host_str().unwrap_or("endpoint").to_owned();

        Ok(Endpoint { name, url })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointStatus {
    pub current: String,
    pub backup: String,
    pub index: usize,
    pub total: usize,
    pub last_rotation_block: Option<i64>,
    pub blocks_until_rotation: u64,
}

/// Round-robin rotation over the configured endpoints, one step every
/// `threshold` blocks or immediately on `force_advance`.
#[derive(Debug)]
pub struct EndpointPool {
    endpoints: Vec<Endpoint>,
    index: usize,
    threshold: u64,
    last_rotation_block: Option<i64>,
}

impl EndpointPool {
    pub fn new(endpoints: Vec<Endpoint>, threshold: u64) -> Result<Self, Error> {
        if endpoints.is_empty() {
            return Err(Error::ConfigurationError(String::from(
                "at least one RPC endpoint is required",
            )));
        }

        if threshold == 0 {
            return Err(Error::ConfigurationError(String::from(
                "ROTATION_THRESHOLD must be greater than zero",
            )));
        }

        Ok(EndpointPool {
            endpoints,
            index: 0,
            threshold,
            last_rotation_block: None,
        })
    }

    pub fn current(&self) -> &Endpoint {
        &self.endpoints[self.index]
    }

    pub fn backup(&self) -> &Endpoint {
        &self.endpoints[(self.index + 1) % self.endpoints.len()]
    }

    /// Sets the baseline unless one is already in place.
    pub fn start_at(&mut self, block_number: i64) {
        if self.last_rotation_block.is_none() {
            self.last_rotation_block = Some(block_number);
        }
    }

    /// Block at which the next scheduled rotation falls due, if any.
    pub fn next_rotation_block(&self) -> Option<i64> {
        if self.endpoints.len() == 1 {
            return None;
        }

        let threshold = i64::try_from(self.threshold).unwrap_or(i64::MAX);
        self.last_rotation_block
            .map(|last| last.saturating_add(threshold))
    }

    /// Rotates once `threshold` blocks have passed since the last rotation.
    /// The first observed block only sets the baseline.
    pub fn advance_if_due(&mut self, block_number: i64) -> bool {
        let Some(last) = self.last_rotation_block else {
            self.last_rotation_block = Some(block_number);
            return false;
        };

        if self.endpoints.len() == 1 {
            return false;
        }

        let elapsed = block_number.saturating_sub(last);
        if elapsed < 0 || (elapsed as u64) < self.threshold {
            return false;
        }

        self.rotate();
        self.last_rotation_block = Some(block_number);
        info!(
            "Endpoint rotated to {} at block {}, next rotation in {} blocks",
            self.current().name,
            block_number,
            self.threshold
        );

        true
    }

    /// Rotates immediately. The next observed block becomes the baseline.
    pub fn force_advance(&mut self) {
        if self.endpoints.len() == 1 {
            return;
        }

        self.rotate();
        self.last_rotation_block = None;
        info!("Endpoint force switched to {}", self.current().name);
    }

    pub fn status(&self, block_number: Option<i64>) -> EndpointStatus {
        let blocks_until_rotation = match (self.last_rotation_block, block_number)
        {
            (Some(last), Some(block)) => {
                let elapsed = block.saturating_sub(last).max(0) as u64;
                self.threshold.saturating_sub(elapsed)
            },
            _ => self.threshold,
        };

        EndpointStatus {
            current: self.current().name.to_owned(),
            backup: self.backup().name.to_owned(),
            index: self.index,
            total: self.endpoints.len(),
            last_rotation_block: self.last_rotation_block,
            blocks_until_rotation,
        }
    }

    fn rotate(&mut self) {
        self.index = (self.index + 1) % self.endpoints.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(names: &[&str], threshold: u64) -> EndpointPool {
        let endpoints = names
            .iter()
            .map(|name| {
                Endpoint::parse(&format!("https://{}.example.org/rpc", name))
                    .unwrap()
            })
            .collect();
        EndpointPool::new(endpoints, threshold).unwrap()
    }

    #[test]
    fn rotates_round_robin_every_threshold_blocks() {
        let mut endpoints = pool(&["a", "b", "c"], 90);

        let mut seen = vec![];
        for block in 0..=270 {
            if endpoints.advance_if_due(block) {
                seen.push((block, endpoints.current().name.to_owned()));
            }
        }

        assert_eq!(
            seen,
            vec![
                (90, String::from("b.example.org")),
                (180, String::from("c.example.org")),
                (270, String::from("a.example.org")),
            ]
        );
    }

    #[test]
    fn first_block_sets_the_baseline() {
        let mut endpoints = pool(&["a", "b"], 90);
        assert!(!endpoints.advance_if_due(1_000));
        assert!(!endpoints.advance_if_due(1_089));
        assert!(endpoints.advance_if_due(1_090));
        assert_eq!(endpoints.current().name, "b.example.org");
    }

    #[test]
    fn force_advance_resets_the_baseline() {
        let mut endpoints = pool(&["a", "b"], 90);
        endpoints.advance_if_due(10);
        endpoints.force_advance();
        assert_eq!(endpoints.current().name, "b.example.org");

        assert!(!endpoints.advance_if_due(95));
        assert!(!endpoints.advance_if_due(184));
        assert!(endpoints.advance_if_due(185));
        assert_eq!(endpoints.current().name, "a.example.org");
    }

    #[test]
    fn next_rotation_follows_the_baseline() {
        let mut endpoints = pool(&["a", "b"], 90);
        assert_eq!(endpoints.next_rotation_block(), None);

        endpoints.start_at(0);
        endpoints.start_at(40);
        assert_eq!(endpoints.next_rotation_block(), Some(90));

        assert!(endpoints.advance_if_due(90));
        assert_eq!(endpoints.next_rotation_block(), Some(180));

        endpoints.force_advance();
        assert_eq!(endpoints.next_rotation_block(), None);
    }

    #[test]
    fn single_endpoint_never_rotates() {
        let mut endpoints = pool(&["a"], 1);
        assert!(!endpoints.advance_if_due(1));
        assert!(!endpoints.advance_if_due(500));
        endpoints.force_advance();
        assert_eq!(endpoints.next_rotation_block(), None);
        assert_eq!(endpoints.current().name, "a.example.org");
        assert_eq!(endpoints.backup().name, "a.example.org");
    }

    #[test]
    fn rejects_invalid_configuration() {
        assert!(EndpointPool::new(vec![], 90).is_err());

        let endpoint = Endpoint::parse("https://a.example.org").unwrap();
        assert!(EndpointPool::new(vec![endpoint], 0).is_err());
    }

    #[test]
    fn status_reports_distance_to_next_rotation() {
        let mut endpoints = pool(&["a", "b"], 90);
        endpoints.advance_if_due(100);

        let status = endpoints.status(Some(130));
        assert_eq!(status.current, "a.example.org");
        assert_eq!(status.backup, "b.example.org");
        assert_eq!(status.total, 2);
        assert_eq!(status.blocks_until_rotation, 60);
    }
}
