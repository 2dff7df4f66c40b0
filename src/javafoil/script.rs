//! The per-case JavaFoil macro.
//!
//! A macro is a fixed sequence of six calls into the JavaFoil scripting host:
//!
//! ```text
//! // JavaFoil auto-generated macro
//! Options.Country(1);
//! Geometry.CreateAirfoil(0, 101, 0.12, 0.0, 0.02, 0.4, 0.0, 0.0, 0.0, 0.0, 1);
//! Options.MachNumber(0.1);
//! Polar.Analyze(100000, 100000, 100000, -10.0, 10.0, 1.0, 1.0, 1.0, 0, false);
//! Polar.Save("/home/user/ML_Aero/results/NACA2412_Re100000_M0p1_polar.xml");
//! JavaFoil.Exit();
//! ```
//!
//! Only the literals change between cases. [`MacroScript::parse`] reads a
//! macro back so existing files can be checked against the template.

use std::fmt;
use std::path::Path;

use crate::error::{SweepError, SweepResult};
use crate::sweep::config::{SweepCase, SweepConfig};

pub const HEADER_COMMENT: &str = "// JavaFoil auto-generated macro";

const TEMPLATE_ORDER: [&str; 6] = [
    "Options.Country",
    "Geometry.CreateAirfoil",
    "Options.MachNumber",
    "Polar.Analyze",
    "Polar.Save",
    "JavaFoil.Exit",
];

/// Arguments of `Geometry.CreateAirfoil`. Fractions are of chord.
#[derive(Clone, Debug, PartialEq)]
pub struct AirfoilArgs {
    /// 0 selects the NACA 4-digit generator
    pub family: u32,
    pub points: usize,
    pub thickness: f64,
    pub thickness_location: f64,
    pub camber: f64,
    pub camber_location: f64,
    pub shape: [f64; 4],
    pub mode: u32,
}

/// Arguments of `Polar.Analyze`.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalyzeArgs {
    pub reynolds: [u64; 3],
    pub alpha_start: f64,
    pub alpha_end: f64,
    pub alpha_step: f64,
    pub factors: [f64; 2],
    pub option: u32,
    pub flag: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MacroCall {
    Country(u32),
    CreateAirfoil(AirfoilArgs),
    MachNumber(f64),
    Analyze(AnalyzeArgs),
    Save(String),
    Exit,
}

impl MacroCall {
    pub fn name(&self) -> &'static str {
        match self {
            MacroCall::Country(_) => "Options.Country",
            MacroCall::CreateAirfoil(_) => "Geometry.CreateAirfoil",
            MacroCall::MachNumber(_) => "Options.MachNumber",
            MacroCall::Analyze(_) => "Polar.Analyze",
            MacroCall::Save(_) => "Polar.Save",
            MacroCall::Exit => "JavaFoil.Exit",
        }
    }

    fn parse(name: &str, args: &[String], line: usize) -> SweepResult<Self> {
        let call = match name {
            "Options.Country" => {
                expect_arity(name, args, 1, line)?;
                MacroCall::Country(parse_int(&args[0], line)? as u32)
            }
            "Geometry.CreateAirfoil" => {
                expect_arity(name, args, 11, line)?;
                MacroCall::CreateAirfoil(AirfoilArgs {
                    family: parse_int(&args[0], line)? as u32,
                    points: parse_int(&args[1], line)? as usize,
                    thickness: parse_float(&args[2], line)?,
                    thickness_location: parse_float(&args[3], line)?,
                    camber: parse_float(&args[4], line)?,
                    camber_location: parse_float(&args[5], line)?,
                    shape: [
                        parse_float(&args[6], line)?,
                        parse_float(&args[7], line)?,
                        parse_float(&args[8], line)?,
                        parse_float(&args[9], line)?,
                    ],
                    mode: parse_int(&args[10], line)? as u32,
                })
            }
            "Options.MachNumber" => {
                expect_arity(name, args, 1, line)?;
                MacroCall::MachNumber(parse_float(&args[0], line)?)
            }
            "Polar.Analyze" => {
                expect_arity(name, args, 10, line)?;
                MacroCall::Analyze(AnalyzeArgs {
                    reynolds: [
                        parse_int(&args[0], line)?,
                        parse_int(&args[1], line)?,
                        parse_int(&args[2], line)?,
                    ],
                    alpha_start: parse_float(&args[3], line)?,
                    alpha_end: parse_float(&args[4], line)?,
                    alpha_step: parse_float(&args[5], line)?,
                    factors: [parse_float(&args[6], line)?, parse_float(&args[7], line)?],
                    option: parse_int(&args[8], line)? as u32,
                    flag: parse_bool(&args[9], line)?,
                })
            }
            "Polar.Save" => {
                expect_arity(name, args, 1, line)?;
                MacroCall::Save(parse_string(&args[0], line)?)
            }
            "JavaFoil.Exit" => {
                expect_arity(name, args, 0, line)?;
                MacroCall::Exit
            }
            other => {
                return Err(SweepError::MacroParse {
                    line,
                    message: format!("unknown call '{}'", other),
                })
            }
        };
        Ok(call)
    }
}

impl fmt::Display for MacroCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name())?;
        match self {
            MacroCall::Country(code) => write!(f, "{}", code)?,
            MacroCall::CreateAirfoil(a) => write!(
                f,
                "{}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}",
                a.family,
                a.points,
                float(a.thickness),
                float(a.thickness_location),
                float(a.camber),
                float(a.camber_location),
                float(a.shape[0]),
                float(a.shape[1]),
                float(a.shape[2]),
                float(a.shape[3]),
                a.mode
            )?,
            MacroCall::MachNumber(mach) => write!(f, "{}", float(*mach))?,
            MacroCall::Analyze(a) => write!(
                f,
                "{}, {}, {}, {}, {}, {}, {}, {}, {}, {}",
                a.reynolds[0],
                a.reynolds[1],
                a.reynolds[2],
                float(a.alpha_start),
                float(a.alpha_end),
                float(a.alpha_step),
                float(a.factors[0]),
                float(a.factors[1]),
                a.option,
                a.flag
            )?,
            MacroCall::Save(path) => write!(f, "\"{}\"", escape(path))?,
            MacroCall::Exit => {}
        }
        write!(f, ");")
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MacroScript {
    pub calls: Vec<MacroCall>,
}

impl MacroScript {
    /// The fixed six-call macro for one sweep case.
    pub fn for_case(case: &SweepCase, config: &SweepConfig) -> Self {
        let airfoil = case.airfoil;
        let alpha = &config.alpha;
        let output = config.polar_path(case);

        let calls = vec![
            MacroCall::Country(config.javafoil.country),
            MacroCall::CreateAirfoil(AirfoilArgs {
                family: 0,
                points: config.execution.num_points,
                thickness: airfoil.thickness_fraction(),
                thickness_location: 0.0,
                camber: airfoil.max_camber_fraction(),
                camber_location: airfoil.camber_location_fraction(),
                shape: [0.0; 4],
                mode: 1,
            }),
            MacroCall::MachNumber(case.mach),
            MacroCall::Analyze(AnalyzeArgs {
                reynolds: [case.reynolds; 3],
                alpha_start: alpha.start,
                alpha_end: alpha.end,
                alpha_step: alpha.step,
                factors: [1.0, 1.0],
                option: 0,
                flag: false,
            }),
            MacroCall::Save(output.to_string_lossy().into_owned()),
            MacroCall::Exit,
        ];

        Self { calls }
    }

    pub fn render(&self) -> String {
        let mut text = String::from(HEADER_COMMENT);
        text.push('\n');
        for call in &self.calls {
            text.push_str(&call.to_string());
            text.push('\n');
        }
        text
    }

    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> SweepResult<()> {
        std::fs::write(path, self.render())?;
        Ok(())
    }

    /// Read a macro back. Comment lines and blank lines are skipped.
    pub fn parse(text: &str) -> SweepResult<Self> {
        let mut calls = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            let stmt = raw.trim();
            if stmt.is_empty() || stmt.starts_with("//") {
                continue;
            }

            let stmt = stmt.strip_suffix(';').unwrap_or(stmt).trim_end();
            let open = stmt.find('(').ok_or_else(|| SweepError::MacroParse {
                line,
                message: "expected '('".to_string(),
            })?;
            if !stmt.ends_with(')') {
                return Err(SweepError::MacroParse {
                    line,
                    message: "expected ')'".to_string(),
                });
            }

            let name = stmt[..open].trim();
            let args = split_args(&stmt[open + 1..stmt.len() - 1], line)?;
            calls.push(MacroCall::parse(name, &args, line)?);
        }

        Ok(Self { calls })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> SweepResult<Self> {
        Self::parse(&std::fs::read_to_string(path)?)
    }

    /// Ways in which this macro departs from the fixed template. Empty when
    /// it conforms.
    pub fn template_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.calls.len() != TEMPLATE_ORDER.len() {
            issues.push(format!(
                "expected {} calls, found {}",
                TEMPLATE_ORDER.len(),
                self.calls.len()
            ));
        }

        for (idx, (call, expected)) in self.calls.iter().zip(TEMPLATE_ORDER).enumerate() {
            if call.name() != expected {
                issues.push(format!(
                    "call {} is {}, expected {}",
                    idx + 1,
                    call.name(),
                    expected
                ));
            }
        }

        if let Some(analyze) = self.analyze() {
            let [low, mid, high] = analyze.reynolds;
            if low != mid || mid != high {
                issues.push(format!(
                    "Reynolds numbers differ: {}, {}, {}",
                    low, mid, high
                ));
            }
            if analyze.alpha_step <= 0.0 {
                issues.push(format!("alpha step {} is not positive", analyze.alpha_step));
            }
            if analyze.alpha_end < analyze.alpha_start {
                issues.push(format!(
                    "alpha range {}..{} is reversed",
                    analyze.alpha_start, analyze.alpha_end
                ));
            }
        }

        if let Some(MacroCall::Save(path)) = self.find("Polar.Save") {
            if !Path::new(path).is_absolute() {
                issues.push(format!("output path '{}' is not absolute", path));
            }
        }

        issues
    }

    fn find(&self, name: &str) -> Option<&MacroCall> {
        self.calls.iter().find(|c| c.name() == name)
    }

    pub fn airfoil(&self) -> Option<&AirfoilArgs> {
        match self.find("Geometry.CreateAirfoil") {
            Some(MacroCall::CreateAirfoil(a)) => Some(a),
            _ => None,
        }
    }

    pub fn analyze(&self) -> Option<&AnalyzeArgs> {
        match self.find("Polar.Analyze") {
            Some(MacroCall::Analyze(a)) => Some(a),
            _ => None,
        }
    }

    pub fn mach(&self) -> Option<f64> {
        match self.find("Options.MachNumber") {
            Some(MacroCall::MachNumber(m)) => Some(*m),
            _ => None,
        }
    }

    pub fn output_path(&self) -> Option<&str> {
        match self.find("Polar.Save") {
            Some(MacroCall::Save(p)) => Some(p.as_str()),
            _ => None,
        }
    }
}

/// Shortest round-trip float text that always keeps a decimal point.
fn float(v: f64) -> String {
    format!("{:?}", v)
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn split_args(s: &str, line: usize) -> SweepResult<Vec<String>> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' if in_quotes => {
                current.push(c);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ',' if !in_quotes => {
                args.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }

    if in_quotes {
        return Err(SweepError::MacroParse {
            line,
            message: "unterminated string".to_string(),
        });
    }
    if !current.trim().is_empty() || !args.is_empty() {
        args.push(current.trim().to_string());
    }
    Ok(args)
}

fn expect_arity(name: &str, args: &[String], n: usize, line: usize) -> SweepResult<()> {
    if args.len() != n {
        return Err(SweepError::MacroParse {
            line,
            message: format!("{} takes {} arguments, found {}", name, n, args.len()),
        });
    }
    Ok(())
}

fn parse_float(token: &str, line: usize) -> SweepResult<f64> {
    token.parse().map_err(|_| SweepError::MacroParse {
        line,
        message: format!("expected a number, found '{}'", token),
    })
}

fn parse_int(token: &str, line: usize) -> SweepResult<u64> {
    token.parse().map_err(|_| SweepError::MacroParse {
        line,
        message: format!("expected an integer, found '{}'", token),
    })
}

fn parse_bool(token: &str, line: usize) -> SweepResult<bool> {
    match token {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(SweepError::MacroParse {
            line,
            message: format!("expected true or false, found '{}'", token),
        }),
    }
}

fn parse_string(token: &str, line: usize) -> SweepResult<String> {
    let inner = token
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .ok_or_else(|| SweepError::MacroParse {
            line,
            message: format!("expected a quoted string, found {}", token),
        })?;

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naca::NacaFourDigit;
    use std::path::PathBuf;

    fn test_config() -> SweepConfig {
        let mut config = SweepConfig::default();
        config.output.base_dir = PathBuf::from("/data/ML_Aero");
        config
    }

    fn naca2412_case() -> SweepCase {
        SweepCase::new(NacaFourDigit::new(2, 40, 12).unwrap(), 100_000, 0.1)
    }

    #[test]
    fn renders_fixed_template() {
        let script = MacroScript::for_case(&naca2412_case(), &test_config());
        let expected = "\
// JavaFoil auto-generated macro
Options.Country(1);
Geometry.CreateAirfoil(0, 101, 0.12, 0.0, 0.02, 0.4, 0.0, 0.0, 0.0, 0.0, 1);
Options.MachNumber(0.1);
Polar.Analyze(100000, 100000, 100000, -10.0, 10.0, 1.0, 1.0, 1.0, 0, false);
Polar.Save(\"/data/ML_Aero/results/NACA2412_Re100000_M0p1_polar.xml\");
JavaFoil.Exit();
";
        assert_eq!(script.render(), expected);
        assert!(script.template_issues().is_empty());
    }

    #[test]
    fn parses_rendered_script() {
        let script = MacroScript::for_case(&naca2412_case(), &test_config());
        let parsed = MacroScript::parse(&script.render()).unwrap();
        assert_eq!(parsed, script);
        assert_eq!(parsed.mach(), Some(0.1));
        assert_eq!(parsed.analyze().unwrap().reynolds, [100_000; 3]);
    }

    #[test]
    fn save_path_escapes_round_trip() {
        let call = MacroCall::Save(r#"C:\runs\"odd".xml"#.to_string());
        let line = call.to_string();
        assert_eq!(line, r#"Polar.Save("C:\\runs\\\"odd\".xml");"#);
        let parsed = MacroScript::parse(&line).unwrap();
        assert_eq!(parsed.calls[0], call);
    }

    #[test]
    fn flags_template_departures() {
        let text = "\
Options.Country(1);
Options.MachNumber(0.2);
Polar.Analyze(100000, 200000, 100000, 10.0, -10.0, 1.0, 1.0, 1.0, 0, false);
Polar.Save(\"relative.xml\");
JavaFoil.Exit();
";
        let script = MacroScript::parse(text).unwrap();
        let issues = script.template_issues();
        assert!(issues.iter().any(|i| i.contains("expected 6 calls")));
        assert!(issues.iter().any(|i| i.contains("Reynolds numbers differ")));
        assert!(issues.iter().any(|i| i.contains("reversed")));
        assert!(issues.iter().any(|i| i.contains("not absolute")));
    }

    #[test]
    fn reports_line_of_bad_statement() {
        let text = "// header\nOptions.Country(1);\nOptions.MachNumber(fast);\n";
        match MacroScript::parse(text) {
            Err(SweepError::MacroParse { line, .. }) => assert_eq!(line, 3),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn rejects_unknown_call_and_wrong_arity() {
        assert!(MacroScript::parse("Polar.Plot(1);").is_err());
        assert!(MacroScript::parse("Options.Country(1, 2);").is_err());
        assert!(MacroScript::parse("Polar.Save(\"open);").is_err());
    }
}
