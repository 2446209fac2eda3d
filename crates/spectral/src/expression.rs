//! Band-math expressions evaluated by the image service.
//!
//! The synthetic hyperspectral request does not download the 426-band cube.
//! Instead it sends an expression describing each target band as a weighted
//! sum of source bands, and the service evaluates it server-side:
//!
//! ```json
//! {
//!   "operation": "weightedBandSum",
//!   "image": "projects/neon/DP3_CPER_2019",
//!   "bands": [
//!     { "name": "B2", "terms": [ { "band": "B015", "weight": 0.031 }, ... ] }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::synthesis::BandWeights;
use crate::Result;

const OPERATION: &str = "weightedBandSum";

/// One source band's contribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub band: String,
    pub weight: f64,
}

/// One output band of the expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionBand {
    pub name: String,
    pub terms: Vec<Term>,
}

/// Weighted band-sum expression over a single source image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticExpression {
    pub operation: String,
    pub image: String,
    pub bands: Vec<ExpressionBand>,
}

impl SyntheticExpression {
    /// Expression producing one band per entry of `weights`, in order.
    pub fn from_weights(image: impl Into<String>, weights: &[BandWeights]) -> Self {
        let bands = weights
            .iter()
            .map(|w| ExpressionBand {
                name: w.target.clone(),
                terms: w
                    .terms()
                    .map(|(band, weight)| Term {
                        band: band.to_string(),
                        weight,
                    })
                    .collect(),
            })
            .collect();

        Self {
            operation: OPERATION.to_string(),
            image: image.into(),
            bands,
        }
    }

    /// Output band names in order.
    pub fn band_names(&self) -> Vec<String> {
        self.bands.iter().map(|b| b.name.clone()).collect()
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expression_document() {
        let weights = vec![BandWeights {
            target: "B4".to_string(),
            indices: vec![55, 56],
            sources: vec!["B056".to_string(), "B057".to_string()],
            weights: vec![0.25, 0.75],
        }];

        let expr = SyntheticExpression::from_weights("projects/neon/DP3_CPER_2019", &weights);
        assert_eq!(expr.band_names(), vec!["B4"]);

        let value = expr.to_value().unwrap();
        assert_eq!(value["operation"], "weightedBandSum");
        assert_eq!(value["image"], "projects/neon/DP3_CPER_2019");
        assert_eq!(value["bands"][0]["name"], "B4");
        assert_eq!(value["bands"][0]["terms"][1]["band"], "B057");
        assert_eq!(value["bands"][0]["terms"][1]["weight"], 0.75);
    }
}
