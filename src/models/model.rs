//! Decay models behind a common capability interface.
//!
//! A model takes the independent-variable array plus a named parameter map and
//! returns model values. The likelihood and the fitter only ever see
//! `dyn DecayModel`, so any closure of the right shape can be fitted too
//! (see [`FnModel`]).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::decay::{DEFAULT_SMOOTHING, broken_power_law, multi_sbpl_curve, simple_power_law};
use crate::error::{GrbError, Result};

/// Named physical model parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelParams(BTreeMap<String, f64>);

impl ModelParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

    /// Value of `name`, or `MissingParameter`.
    pub fn get(&self, name: &str) -> Result<f64> {
        self.0
            .get(name)
            .copied()
            .ok_or_else(|| GrbError::MissingParameter { name: name.to_string() })
    }

    pub fn remove(&mut self, name: &str) -> Option<f64> {
        self.0.remove(name)
    }

    pub fn get_or(&self, name: &str, default: f64) -> f64 {
        self.0.get(name).copied().unwrap_or(default)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Values of `names`, in order.
    pub fn values_of(&self, names: &[String]) -> Result<Vec<f64>> {
        names.iter().map(|n| self.get(n)).collect()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for ModelParams {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Decay-model capability: `(x, params) -> model(x)`.
pub trait DecayModel: Send + Sync {
    fn name(&self) -> &str;

    /// Parameter names, in the order samplers see them.
    fn param_names(&self) -> Vec<String>;

    fn evaluate(&self, x: &[f64], params: &ModelParams) -> Result<Vec<f64>>;
}

/// `norm · x^(-alpha)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimplePowerLaw;

impl DecayModel for SimplePowerLaw {
    fn name(&self) -> &str {
        "simple_power_law"
    }

    fn param_names(&self) -> Vec<String> {
        vec!["norm".into(), "alpha".into()]
    }

    fn evaluate(&self, x: &[f64], params: &ModelParams) -> Result<Vec<f64>> {
        let norm = params.get("norm")?;
        let alpha = params.get("alpha")?;
        Ok(x.iter().map(|&xi| simple_power_law(xi, norm, alpha)).collect())
    }
}

/// Single smoothly broken power law. `delta` defaults to 0.5 when absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrokenPowerLaw;

impl DecayModel for BrokenPowerLaw {
    fn name(&self) -> &str {
        "broken_power_law"
    }

    fn param_names(&self) -> Vec<String> {
        ["norm", "t_break", "alpha1", "alpha2", "delta"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    fn evaluate(&self, x: &[f64], params: &ModelParams) -> Result<Vec<f64>> {
        let norm = params.get("norm")?;
        let t_break = params.get("t_break")?;
        let alpha1 = params.get("alpha1")?;
        let alpha2 = params.get("alpha2")?;
        let delta = params.get_or("delta", DEFAULT_SMOOTHING);
        Ok(x
            .iter()
            .map(|&xi| broken_power_law(xi, norm, t_break, alpha1, alpha2, delta))
            .collect())
    }
}

/// Multi-segment smoothly broken power law with a fixed number of breaks.
///
/// Parameters: `norm`, `t_break_1..n`, `alpha_1..n+1`, `delta_1..n`.
#[derive(Debug, Clone, Copy)]
pub struct MultiBrokenPowerLaw {
    pub n_breaks: usize,
}

impl MultiBrokenPowerLaw {
    pub fn new(n_breaks: usize) -> Self {
        Self { n_breaks }
    }

    fn break_names(&self) -> Vec<String> {
        (1..=self.n_breaks).map(|i| format!("t_break_{i}")).collect()
    }

    fn alpha_names(&self) -> Vec<String> {
        (1..=self.n_breaks + 1).map(|i| format!("alpha_{i}")).collect()
    }

    fn delta_names(&self) -> Vec<String> {
        (1..=self.n_breaks).map(|i| format!("delta_{i}")).collect()
    }
}

impl DecayModel for MultiBrokenPowerLaw {
    fn name(&self) -> &str {
        "multi_sbpl"
    }

    fn param_names(&self) -> Vec<String> {
        let mut names = vec!["norm".to_string()];
        names.extend(self.break_names());
        names.extend(self.alpha_names());
        names.extend(self.delta_names());
        names
    }

    fn evaluate(&self, x: &[f64], params: &ModelParams) -> Result<Vec<f64>> {
        let norm = params.get("norm")?;
        let breakpoints = params.values_of(&self.break_names())?;
        let alphas = params.values_of(&self.alpha_names())?;
        let deltas = params.values_of(&self.delta_names())?;
        multi_sbpl_curve(x, norm, &breakpoints, &alphas, &deltas)
    }
}

/// Adapts a closure to [`DecayModel`].
pub struct FnModel<F> {
    name: String,
    params: Vec<String>,
    f: F,
}

impl<F> FnModel<F>
where
    F: Fn(&[f64], &ModelParams) -> Result<Vec<f64>> + Send + Sync,
{
    pub fn new(name: impl Into<String>, params: &[&str], f: F) -> Self {
        Self {
            name: name.into(),
            params: params.iter().map(|s| s.to_string()).collect(),
            f,
        }
    }
}

impl<F> DecayModel for FnModel<F>
where
    F: Fn(&[f64], &ModelParams) -> Result<Vec<f64>> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn param_names(&self) -> Vec<String> {
        self.params.clone()
    }

    fn evaluate(&self, x: &[f64], params: &ModelParams) -> Result<Vec<f64>> {
        (self.f)(x, params)
    }
}

/// The built-in decay models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Simple,
    Broken,
    Multi(usize),
}

impl ModelKind {
    pub fn build(self) -> Box<dyn DecayModel> {
        match self {
            ModelKind::Simple => Box::new(SimplePowerLaw),
            ModelKind::Broken => Box::new(BrokenPowerLaw),
            ModelKind::Multi(n) => Box::new(MultiBrokenPowerLaw::new(n)),
        }
    }

    pub fn param_count(self) -> usize {
        match self {
            ModelKind::Simple => 2,
            ModelKind::Broken => 5,
            ModelKind::Multi(n) => 3 * n + 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, f64)]) -> ModelParams {
        pairs.iter().map(|&(k, v)| (k, v)).collect()
    }

    #[test]
    fn registry_parameter_names() {
        assert_eq!(ModelKind::Simple.build().param_names(), vec!["norm", "alpha"]);
        assert_eq!(
            ModelKind::Multi(2).build().param_names(),
            vec!["norm", "t_break_1", "t_break_2", "alpha_1", "alpha_2", "alpha_3", "delta_1", "delta_2"]
        );
        for kind in [ModelKind::Simple, ModelKind::Broken, ModelKind::Multi(3)] {
            assert_eq!(kind.build().param_names().len(), kind.param_count());
        }
    }

    #[test]
    fn missing_parameter_is_named() {
        let err = SimplePowerLaw
            .evaluate(&[1.0], &params(&[("norm", 1.0)]))
            .unwrap_err();
        assert!(matches!(err, GrbError::MissingParameter { ref name } if name == "alpha"));
    }

    #[test]
    fn broken_law_defaults_delta() {
        let x = [10.0, 1000.0];
        let p = params(&[("norm", 1.0), ("t_break", 100.0), ("alpha1", 0.5), ("alpha2", 1.5)]);
        let mut explicit = p.clone();
        explicit.insert("delta", DEFAULT_SMOOTHING);
        assert_eq!(
            BrokenPowerLaw.evaluate(&x, &p).unwrap(),
            BrokenPowerLaw.evaluate(&x, &explicit).unwrap()
        );
    }

    #[test]
    fn multi_model_with_one_break_matches_broken_model() {
        let x = [1.0, 50.0, 5e3, 5e5];
        let multi = MultiBrokenPowerLaw::new(1)
            .evaluate(
                &x,
                &params(&[
                    ("norm", 2.0),
                    ("t_break_1", 1e3),
                    ("alpha_1", 0.8),
                    ("alpha_2", 1.7),
                    ("delta_1", 0.2),
                ]),
            )
            .unwrap();
        let broken = BrokenPowerLaw
            .evaluate(
                &x,
                &params(&[
                    ("norm", 2.0),
                    ("t_break", 1e3),
                    ("alpha1", 0.8),
                    ("alpha2", 1.7),
                    ("delta", 0.2),
                ]),
            )
            .unwrap();
        assert_eq!(multi, broken);
    }

    #[test]
    fn closures_can_be_used_as_models() {
        let model = FnModel::new("exp_decay", &["amp", "tau"], |x: &[f64], p: &ModelParams| {
            let amp = p.get("amp")?;
            let tau = p.get("tau")?;
            Ok(x.iter().map(|xi| amp * (-xi / tau).exp()).collect())
        });
        let y = model
            .evaluate(&[0.0], &params(&[("amp", 4.0), ("tau", 2.0)]))
            .unwrap();
        assert_eq!(y, vec![4.0]);
        assert_eq!(model.param_names(), vec!["amp", "tau"]);
    }

    #[test]
    fn params_deserialize_from_json_object() {
        let p: ModelParams = serde_json::from_str(r#"{"norm": 1.5, "alpha": 1.1}"#).unwrap();
        assert_eq!(p.get("alpha").unwrap(), 1.1);
        assert_eq!(p.len(), 2);
    }
}
