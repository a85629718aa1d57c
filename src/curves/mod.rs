//! Risk-free term structure: Smith-Wilson calibration, extrapolation and
//! multi-year forward projection

mod market;
mod projection;
mod term_structure;
mod wilson;

pub use market::{CalibratedCurve, Curves, RateKind};
pub use projection::{calc_fwd_rates, project_forward_rates, project_year};
pub use term_structure::TermStructure;
pub use wilson::{calibrate_alpha, convergence_point, galfa, sw_calibrate, sw_extrapolate, wilson_heart};

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::NaiveDate;

    use super::{Curves, TermStructure};
    use crate::trace::Tracer;

    /// Six-point curve with UFR 4.2%, projected and calibrated for `n_years`
    pub(crate) fn sample_curves(n_years: usize) -> Curves {
        let date = NaiveDate::from_ymd_opt(2023, 7, 24).unwrap();
        let mut curves = Curves::new(0.042, 1e-10, 0.0001, date, "SI").unwrap();
        let observed = TermStructure::new(
            vec![1.0, 2.0, 4.0, 5.0, 6.0, 7.0],
            vec![0.01, 0.02, 0.03, 0.032, 0.035, 0.04],
        )
        .unwrap();
        curves.set_observed_term_structure(observed);
        curves.calc_fwd_rates().unwrap();
        curves.project_forward_rates(n_years).unwrap();
        curves.calibrate_projected((0.05, 0.5), 1000, Tracer::disabled()).unwrap();
        curves
    }
}
