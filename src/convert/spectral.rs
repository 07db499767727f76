//! X-ray band flux → monochromatic flux density.
//!
//! For a power-law spectrum `N(E) ∝ E^(-β)` (energy index `β = Γ - 1`, with `Γ`
//! the photon index) an integrated energy flux over `[E1, E2]` keV maps to a
//! flux density at `E_obs`:
//!
//! ```text
//! I(β)     = ln(E2/E1)                          if β == 1
//!          = (E2^(1-β) - E1^(1-β)) / (1-β)      otherwise
//! F(E_obs) = Flux / I(β) · E_obs^(-β)
//! ```
//!
//! Uncertainties combine in quadrature from `∂F/∂Flux = E_obs^(-β)/I(β)` and
//! `∂F/∂β = -ln(E_obs) · F(E_obs)`.
//!
//! `∂F/∂β` holds `I(β)` fixed; the `∂I/∂β` term is not propagated. The formula is
//! kept as-is so results stay comparable with earlier reductions.

use crate::domain::DensityConversionParams;
use crate::error::{GrbError, Result};

pub const DEFAULT_E1_KEV: f64 = 0.3;
pub const DEFAULT_E2_KEV: f64 = 10.0;
pub const DEFAULT_E_OBS_KEV: f64 = 1.0;

/// erg cm⁻² s⁻¹ keV⁻¹ → mJy: divide by 1 keV/h in Hz, then 1 mJy = 1e-26 erg cm⁻² s⁻¹ Hz⁻¹.
pub const ERG_CM2_S_KEV_TO_MJY: f64 = 1e26 / 241_797_944_177_033_445.0;

/// Where the spectral index came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpectralIndex {
    /// Photon index `Γ`; `β = Γ - 1`.
    PhotonIndex { photon_index: f64, sigma: f64 },
    /// Deprecated: energy index `β` given directly as `beta_X`.
    LegacyBeta { beta: f64, sigma: f64 },
}

impl SpectralIndex {
    pub fn beta(self) -> f64 {
        match self {
            SpectralIndex::PhotonIndex { photon_index, .. } => photon_index - 1.0,
            SpectralIndex::LegacyBeta { beta, .. } => beta,
        }
    }

    pub fn sigma_beta(self) -> f64 {
        match self {
            SpectralIndex::PhotonIndex { sigma, .. } | SpectralIndex::LegacyBeta { sigma, .. } => sigma,
        }
    }
}

/// Canonical, validated spectral configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralConfig {
    pub index: SpectralIndex,
    pub beta: f64,
    pub sigma_beta: f64,
    pub e1: f64,
    pub e2: f64,
    pub e_obs: f64,
}

impl SpectralConfig {
    /// Resolve user parameters to `(β, σβ)` and an energy band.
    ///
    /// `photon_index` wins over `beta_X`. Falling back to `beta_X` logs a single
    /// deprecation warning; supplying neither is an error.
    pub fn resolve(params: &DensityConversionParams) -> Result<Self> {
        let index = if let Some(photon_index) = params.photon_index {
            SpectralIndex::PhotonIndex {
                photon_index,
                sigma: params.sigma_photon_index.unwrap_or(0.0),
            }
        } else if let Some(beta) = params.beta_x {
            log::warn!("'beta_X' is deprecated; supply 'photon_index' (beta = photon_index - 1) instead");
            SpectralIndex::LegacyBeta {
                beta,
                sigma: params.sigma_beta_x.unwrap_or(0.0),
            }
        } else {
            return Err(GrbError::MissingSpectralIndex);
        };

        let config = SpectralConfig {
            index,
            beta: index.beta(),
            sigma_beta: index.sigma_beta(),
            e1: params.e1.unwrap_or(DEFAULT_E1_KEV),
            e2: params.e2.unwrap_or(DEFAULT_E2_KEV),
            e_obs: params.e_obs.unwrap_or(DEFAULT_E_OBS_KEV),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(self.beta.is_finite() && self.sigma_beta.is_finite() && self.sigma_beta >= 0.0) {
            return Err(GrbError::InvalidConfig(format!(
                "spectral index must be finite with a non-negative uncertainty (beta={}, sigma={})",
                self.beta, self.sigma_beta
            )));
        }
        if !(self.e1.is_finite() && self.e2.is_finite() && self.e1 > 0.0 && self.e2 > self.e1) {
            return Err(GrbError::InvalidConfig(format!(
                "energy band must satisfy 0 < E1 < E2 (E1={}, E2={})",
                self.e1, self.e2
            )));
        }
        if !(self.e_obs.is_finite() && self.e_obs > 0.0) {
            return Err(GrbError::InvalidConfig(format!("E_obs must be > 0 (got {})", self.e_obs)));
        }
        Ok(())
    }

    /// Flux density (erg cm⁻² s⁻¹ keV⁻¹) and its error at `e_obs`.
    pub fn flux_density(&self, flux: f64, sigma_flux: f64) -> (f64, f64) {
        energy_flux_density(flux, sigma_flux, self.beta, self.sigma_beta, self.e1, self.e2, self.e_obs)
    }

    /// Flux density and error at `e_obs`, in mJy.
    pub fn flux_density_mjy(&self, flux: f64, sigma_flux: f64) -> (f64, f64) {
        let (f, e) = self.flux_density(flux, sigma_flux);
        (f * ERG_CM2_S_KEV_TO_MJY, e * ERG_CM2_S_KEV_TO_MJY)
    }
}

/// `∫ E · E^(-β-1) dE` over `[e1, e2]` in the normalisation used above.
///
/// `β == 1` takes the logarithmic branch exactly; there is no epsilon window.
pub fn band_integral(beta: f64, e1: f64, e2: f64) -> f64 {
    if beta == 1.0 {
        (e2 / e1).ln()
    } else {
        (e2.powf(1.0 - beta) - e1.powf(1.0 - beta)) / (1.0 - beta)
    }
}

/// Flux density at `e_obs` with first-order error propagation.
pub fn energy_flux_density(
    flux: f64,
    sigma_flux: f64,
    beta: f64,
    sigma_beta: f64,
    e1: f64,
    e2: f64,
    e_obs: f64,
) -> (f64, f64) {
    let integral = band_integral(beta, e1, e2);
    let e_term = e_obs.powf(-beta);
    let f_e = flux / integral * e_term;

    let df_dflux = e_term / integral;
    let df_dbeta = -e_obs.ln() * flux / integral * e_term;
    let sigma = ((df_dflux * sigma_flux).powi(2) + (df_dbeta * sigma_beta).powi(2)).sqrt();
    (f_e, sigma)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn photon(index: f64) -> DensityConversionParams {
        DensityConversionParams {
            photon_index: Some(index),
            ..Default::default()
        }
    }

    #[test]
    fn unit_index_uses_log_branch() {
        assert_eq!(band_integral(1.0, 0.3, 10.0), (10.0f64 / 0.3).ln());
    }

    #[test]
    fn power_branch_converges_to_log_branch() {
        let exact = band_integral(1.0, 0.3, 10.0);
        for eps in [1e-4, 1e-6, -1e-6] {
            assert_relative_eq!(band_integral(1.0 + eps, 0.3, 10.0), exact, max_relative = 1e-3);
        }
        assert_relative_eq!(band_integral(1.0 + 1e-7, 0.3, 10.0), exact, max_relative = 1e-6);
    }

    #[test]
    fn power_branch_matches_closed_form() {
        // β = 0: ∫ dE = E2 - E1
        assert_relative_eq!(band_integral(0.0, 0.3, 10.0), 9.7, max_relative = 1e-12);
        // β = 2: 1/E1 - 1/E2
        assert_relative_eq!(band_integral(2.0, 0.5, 2.0), 1.5, max_relative = 1e-12);
    }

    #[test]
    fn photon_index_is_preferred_over_beta() {
        let params = DensityConversionParams {
            photon_index: Some(2.2),
            sigma_photon_index: Some(0.1),
            beta_x: Some(0.5),
            ..Default::default()
        };
        let cfg = SpectralConfig::resolve(&params).unwrap();
        assert_relative_eq!(cfg.beta, 1.2, max_relative = 1e-12);
        assert_eq!(cfg.sigma_beta, 0.1);
        assert!(matches!(cfg.index, SpectralIndex::PhotonIndex { .. }));
    }

    #[test]
    fn legacy_beta_is_accepted() {
        let params = DensityConversionParams {
            beta_x: Some(0.9),
            sigma_beta_x: Some(0.05),
            ..Default::default()
        };
        let cfg = SpectralConfig::resolve(&params).unwrap();
        assert_eq!(cfg.beta, 0.9);
        assert_eq!(cfg.sigma_beta, 0.05);
        assert!(matches!(cfg.index, SpectralIndex::LegacyBeta { .. }));
    }

    #[test]
    fn missing_index_is_a_configuration_error() {
        let params = DensityConversionParams {
            e1: Some(0.5),
            ..Default::default()
        };
        assert!(matches!(
            SpectralConfig::resolve(&params),
            Err(GrbError::MissingSpectralIndex)
        ));
    }

    #[test]
    fn defaults_fill_band_and_observed_energy() {
        let cfg = SpectralConfig::resolve(&photon(2.0)).unwrap();
        assert_eq!((cfg.e1, cfg.e2, cfg.e_obs), (0.3, 10.0, 1.0));
        assert_eq!(cfg.sigma_beta, 0.0);
    }

    #[test]
    fn inverted_band_is_rejected() {
        let params = DensityConversionParams {
            e1: Some(10.0),
            e2: Some(0.3),
            ..photon(2.0)
        };
        assert!(matches!(SpectralConfig::resolve(&params), Err(GrbError::InvalidConfig(_))));
    }

    #[test]
    fn flux_density_at_one_kev_ignores_index_error() {
        // ln(1 keV) = 0, so only the flux error contributes.
        let (f, e) = energy_flux_density(1e-10, 1e-11, 1.0, 0.3, 0.3, 10.0, 1.0);
        let integral = (10.0f64 / 0.3).ln();
        assert_relative_eq!(f, 1e-10 / integral, max_relative = 1e-12);
        assert_relative_eq!(e, 1e-11 / integral, max_relative = 1e-12);
    }

    #[test]
    fn index_error_scales_with_log_energy() {
        let (f, e) = energy_flux_density(1e-10, 0.0, 1.0, 0.2, 0.3, 10.0, 2.0);
        assert_relative_eq!(e, 2f64.ln() * f * 0.2, max_relative = 1e-12);
    }

    #[test]
    fn mjy_conversion_uses_fixed_constant() {
        let cfg = SpectralConfig::resolve(&photon(2.0)).unwrap();
        let (f_kev, _) = cfg.flux_density(1e-11, 0.0);
        let (f_mjy, _) = cfg.flux_density_mjy(1e-11, 0.0);
        assert_eq!(f_mjy, f_kev * ERG_CM2_S_KEV_TO_MJY);
        assert_relative_eq!(ERG_CM2_S_KEV_TO_MJY, 4.135_667_696e8, max_relative = 1e-9);
    }

    /// Collects warnings emitted on the current test thread.
    struct CaptureWarnings;

    thread_local! {
        static WARNINGS: std::cell::RefCell<Vec<String>> = const { std::cell::RefCell::new(Vec::new()) };
    }

    impl log::Log for CaptureWarnings {
        fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
            metadata.level() <= log::Level::Warn
        }

        fn log(&self, record: &log::Record<'_>) {
            if self.enabled(record.metadata()) {
                WARNINGS.with(|w| w.borrow_mut().push(record.args().to_string()));
            }
        }

        fn flush(&self) {}
    }

    fn take_warnings(f: impl FnOnce()) -> Vec<String> {
        static LOGGER: CaptureWarnings = CaptureWarnings;
        static INIT: std::sync::Once = std::sync::Once::new();
        INIT.call_once(|| {
            let _ = log::set_logger(&LOGGER);
            log::set_max_level(log::LevelFilter::Warn);
        });
        WARNINGS.with(|w| w.borrow_mut().clear());
        f();
        WARNINGS.with(|w| w.borrow_mut().drain(..).collect())
    }

    #[test]
    fn legacy_beta_warns_once_per_resolution() {
        let legacy = DensityConversionParams {
            beta_x: Some(1.1),
            ..Default::default()
        };
        let warnings = take_warnings(|| {
            SpectralConfig::resolve(&legacy).unwrap();
        });
        assert_eq!(warnings.len(), 1, "{warnings:?}");
        assert!(warnings[0].contains("beta_X"));

        let warnings = take_warnings(|| {
            SpectralConfig::resolve(&photon(2.0)).unwrap();
            SpectralConfig::resolve(&DensityConversionParams {
                beta_x: Some(1.1),
                ..photon(2.0)
            })
            .unwrap();
        });
        assert!(warnings.is_empty(), "{warnings:?}");
    }
}
