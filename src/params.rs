//! Form state: the five segmentation parameters, the algorithm selection,
//! and the bidirectional slider/text binding for each parameter.

/// Static description of one tunable parameter.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    /// Field name suffix used on the wire (`input-<name>`).
    pub name: &'static str,
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub start: f64,
    /// Integer-typed parameters display and post without decimals.
    pub integer: bool,
}

pub const SIGMA: ParamSpec = ParamSpec {
    name: "sigma",
    label: "Sigma (smoothing)",
    min: 0.0,
    max: 1.0,
    step: 0.05,
    start: 0.8,
    integer: false,
};

pub const K: ParamSpec = ParamSpec {
    name: "k",
    label: "K (threshold)",
    min: 0.0,
    max: 3000.0,
    step: 10.0,
    start: 300.0,
    integer: true,
};

pub const MINSIZE: ParamSpec = ParamSpec {
    name: "minsize",
    label: "Min region size",
    min: 1.0,
    max: 1000.0,
    step: 1.0,
    start: 50.0,
    integer: true,
};

pub const MINWEIGHT: ParamSpec = ParamSpec {
    name: "minweight",
    label: "Min weight",
    min: 0.0,
    max: 50.0,
    step: 1.0,
    start: 10.0,
    integer: true,
};

pub const INITCREDIT: ParamSpec = ParamSpec {
    name: "initcredit",
    label: "Initial credit",
    min: 1.0,
    max: 1000.0,
    step: 5.0,
    start: 100.0,
    integer: true,
};

impl ParamSpec {
    /// Decimal places needed to print any on-step value exactly.
    pub fn decimals(&self) -> usize {
        if self.integer {
            return 0;
        }
        let mut step = self.step;
        let mut decimals = 0;
        while step.fract().abs() > 1e-9 && decimals < 6 {
            step *= 10.0;
            decimals += 1;
        }
        decimals
    }
}

/// One canonical numeric value linked to both a bounded control and a plain
/// text field. Both entry points funnel through the same clamp/snap logic and
/// write the result back to both representations.
///
/// Edge policy: numeric entry outside `[min, max]` is clamped on commit;
/// non-numeric entry never propagates (the canonical value is untouched and
/// the text reverts). The range maximum is always a legal value even when it
/// is not a whole number of steps from the minimum.
#[derive(Debug, Clone)]
pub struct ParamBinding {
    spec: ParamSpec,
    value: f64,
    text: String,
}

impl ParamBinding {
    pub fn new(spec: ParamSpec) -> Self {
        let mut binding = Self {
            spec,
            value: 0.0,
            text: String::new(),
        };
        binding.set_from_control(spec.start);
        binding
    }

    pub fn spec(&self) -> &ParamSpec {
        &self.spec
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Text-field buffer. The UI edits this in place; nothing propagates to
    /// the canonical value until [`commit_text`](Self::commit_text).
    pub fn text_mut(&mut self) -> &mut String {
        &mut self.text
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    fn snap(&self, raw: f64) -> f64 {
        let clamped = raw.clamp(self.spec.min, self.spec.max);
        let steps = ((clamped - self.spec.min) / self.spec.step).round();
        (self.spec.min + steps * self.spec.step).clamp(self.spec.min, self.spec.max)
    }

    fn canonical_text(&self, value: f64) -> String {
        if self.spec.integer {
            format!("{}", value.round() as i64)
        } else {
            format!("{:.*}", self.spec.decimals(), value)
        }
    }

    /// A change originating in the bounded control: clamp, snap, and reflect
    /// into the text field.
    pub fn set_from_control(&mut self, raw: f64) {
        self.value = self.snap(raw);
        self.text = self.canonical_text(self.value);
    }

    /// A committed change originating in the text field (enter / focus loss).
    /// Returns whether the entry propagated to the canonical value.
    pub fn commit_text(&mut self) -> bool {
        match self.text.trim().parse::<f64>() {
            Ok(raw) if raw.is_finite() => {
                self.set_from_control(raw);
                true
            }
            _ => {
                self.text = self.canonical_text(self.value);
                false
            }
        }
    }

    /// The value as posted on the wire, identical to the displayed text.
    pub fn form_value(&self) -> String {
        self.canonical_text(self.value)
    }
}

/// Which segmentation algorithm the job runs. Determines which of the two
/// parameter panels is visible; switching never touches parameter values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Gbs,
    Hmsf,
}

impl Algorithm {
    pub const ALL: &[Algorithm] = &[Algorithm::Gbs, Algorithm::Hmsf];

    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Gbs => "Graph-based (GBS)",
            Algorithm::Hmsf => "Min spanning forest (HMSF)",
        }
    }

    pub fn wire_value(self) -> &'static str {
        match self {
            Algorithm::Gbs => "1",
            Algorithm::Hmsf => "2",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphKind {
    Kings,
    Grid,
}

impl GraphKind {
    pub const ALL: &[GraphKind] = &[GraphKind::Kings, GraphKind::Grid];

    pub fn name(self) -> &'static str {
        match self {
            GraphKind::Kings => "King's graph",
            GraphKind::Grid => "Grid graph",
        }
    }

    pub fn wire_value(self) -> &'static str {
        match self {
            GraphKind::Kings => "1",
            GraphKind::Grid => "2",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightFn {
    NearestNeighbor,
    IntensityDifference,
}

impl WeightFn {
    pub const ALL: &[WeightFn] = &[WeightFn::NearestNeighbor, WeightFn::IntensityDifference];

    pub fn name(self) -> &'static str {
        match self {
            WeightFn::NearestNeighbor => "Nearest neighbor",
            WeightFn::IntensityDifference => "Intensity difference",
        }
    }

    pub fn wire_value(self) -> &'static str {
        match self {
            WeightFn::NearestNeighbor => "1",
            WeightFn::IntensityDifference => "2",
        }
    }
}

/// The whole settings form as the user left it.
#[derive(Debug, Clone)]
pub struct SegmentForm {
    pub sigma: ParamBinding,
    pub k: ParamBinding,
    pub minsize: ParamBinding,
    pub minweight: ParamBinding,
    pub initcredit: ParamBinding,
    pub algorithm: Algorithm,
    pub graph: GraphKind,
    pub weightfn: WeightFn,
    pub random_colors: bool,
}

impl Default for SegmentForm {
    fn default() -> Self {
        Self {
            sigma: ParamBinding::new(SIGMA),
            k: ParamBinding::new(K),
            minsize: ParamBinding::new(MINSIZE),
            minweight: ParamBinding::new(MINWEIGHT),
            initcredit: ParamBinding::new(INITCREDIT),
            algorithm: Algorithm::Gbs,
            graph: GraphKind::Kings,
            weightfn: WeightFn::NearestNeighbor,
            random_colors: false,
        }
    }
}

impl SegmentForm {
    /// Flat field list for the multipart request. All five parameters are
    /// posted regardless of the selected algorithm; the server reads the
    /// subset it needs. The checkbox follows HTML form semantics: present as
    /// `on` when checked, absent otherwise.
    pub fn fields(&self) -> Vec<(String, String)> {
        let mut fields = Vec::with_capacity(9);
        for binding in [
            &self.sigma,
            &self.k,
            &self.minsize,
            &self.minweight,
            &self.initcredit,
        ] {
            fields.push((
                format!("input-{}", binding.spec().name),
                binding.form_value(),
            ));
        }
        fields.push(("algorithm".into(), self.algorithm.wire_value().into()));
        fields.push(("graph".into(), self.graph.wire_value().into()));
        fields.push(("weightfn".into(), self.weightfn.wire_value().into()));
        if self.random_colors {
            fields.push(("color".into(), "on".into()));
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_and_text_round_trip_on_step_values() {
        for spec in [SIGMA, K, MINSIZE, MINWEIGHT, INITCREDIT] {
            let mut binding = ParamBinding::new(spec);
            let steps = ((spec.max - spec.min) / spec.step) as i64;
            for i in [0, 1, steps / 2, steps] {
                let v = spec.min + i as f64 * spec.step;
                binding.set_from_control(v.min(spec.max));
                let reread: f64 = binding.text().parse().expect("canonical text parses");
                assert!(
                    (reread - binding.value()).abs() < 1e-9,
                    "{}: text {} != value {}",
                    spec.name,
                    binding.text(),
                    binding.value()
                );
            }
        }
    }

    #[test]
    fn control_input_is_clamped_and_snapped() {
        let mut k = ParamBinding::new(K);
        k.set_from_control(12_345.0);
        assert_eq!(k.value(), 3000.0);
        k.set_from_control(-5.0);
        assert_eq!(k.value(), 0.0);
        k.set_from_control(304.9);
        assert_eq!(k.value(), 300.0);
        assert_eq!(k.text(), "300");
    }

    #[test]
    fn sigma_snaps_to_five_hundredths() {
        let mut sigma = ParamBinding::new(SIGMA);
        sigma.set_from_control(0.837);
        assert!((sigma.value() - 0.85).abs() < 1e-9);
        assert_eq!(sigma.text(), "0.85");
    }

    #[test]
    fn out_of_range_text_entry_clamps_on_commit() {
        let mut minweight = ParamBinding::new(MINWEIGHT);
        *minweight.text_mut() = "900".into();
        assert!(minweight.commit_text());
        assert_eq!(minweight.value(), 50.0);
        assert_eq!(minweight.text(), "50");
    }

    #[test]
    fn non_numeric_text_entry_does_not_propagate() {
        let mut minsize = ParamBinding::new(MINSIZE);
        let before = minsize.value();
        *minsize.text_mut() = "lots".into();
        assert!(!minsize.commit_text());
        assert_eq!(minsize.value(), before);
        assert_eq!(minsize.text(), "50");
    }

    #[test]
    fn range_max_is_legal_even_off_step() {
        // initcredit: min 1, step 5, so 1000 is not a whole number of steps.
        let mut initcredit = ParamBinding::new(INITCREDIT);
        initcredit.set_from_control(1000.0);
        assert_eq!(initcredit.value(), 1000.0);
        assert_eq!(initcredit.text(), "1000");
    }

    #[test]
    fn defaults_are_in_range_and_on_step() {
        let form = SegmentForm::default();
        assert_eq!(form.sigma.text(), "0.80");
        assert_eq!(form.k.text(), "300");
        assert_eq!(form.minsize.text(), "50");
        assert_eq!(form.minweight.text(), "10");
        assert_eq!(form.initcredit.text(), "100");
    }

    #[test]
    fn fields_cover_all_parameters_and_options() {
        let mut form = SegmentForm::default();
        form.algorithm = Algorithm::Hmsf;
        let fields = form.fields();
        let get = |name: &str| {
            fields
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("input-sigma"), Some("0.80"));
        assert_eq!(get("input-k"), Some("300"));
        assert_eq!(get("input-minsize"), Some("50"));
        assert_eq!(get("input-minweight"), Some("10"));
        assert_eq!(get("input-initcredit"), Some("100"));
        assert_eq!(get("algorithm"), Some("2"));
        assert_eq!(get("graph"), Some("1"));
        assert_eq!(get("weightfn"), Some("1"));
        assert_eq!(get("color"), None);

        form.random_colors = true;
        let fields = form.fields();
        assert!(fields.iter().any(|(k, v)| k == "color" && v == "on"));
    }
}
