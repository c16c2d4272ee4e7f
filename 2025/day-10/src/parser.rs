use chumsky::prelude::*;
use miette::NamedSource;

use crate::error::Error;
use crate::machine::{Counters, Lights, Machine};

/// One line of the manual: indicator diagram, button wiring and, optionally,
/// the joltage requirements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schematic {
    pub lights: Vec<bool>,
    pub wiring: Vec<Vec<usize>>,
    pub joltage: Option<Vec<u64>>,
}

impl Schematic {
    pub fn width(&self) -> usize {
        self.lights.len()
    }

    /// The machine whose buttons toggle indicator lights.
    pub fn indicator_machine(&self) -> Result<Machine<Lights>, Error> {
        let target = self.lights.iter().copied().collect::<Lights>();
        Machine::from_wiring(&self.wiring, target)
    }

    /// The machine whose buttons raise joltage counters.
    pub fn joltage_machine(&self) -> Result<Machine<Counters>, Error> {
        let levels = self.joltage.clone().ok_or(Error::MissingJoltage)?;
        Machine::from_wiring(&self.wiring, Counters::new(levels))
    }
}

impl From<&Machine<Lights>> for Schematic {
    fn from(machine: &Machine<Lights>) -> Self {
        let wiring = machine
            .buttons()
            .iter()
            .map(|effect| effect.iter_ones().collect())
            .collect();
        Self {
            lights: machine.target().iter().by_vals().collect(),
            wiring,
            joltage: None,
        }
    }
}

type Wiring = (Vec<usize>, SimpleSpan);

fn number<'a, T>() -> impl Parser<'a, &'a str, T, extra::Err<Rich<'a, char>>> + Clone
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    text::int(10).try_map(|digits: &str, span| {
        digits
            .parse::<T>()
            .map_err(|err| Rich::custom(span, format!("`{digits}` is not a valid number: {err}")))
    })
}

fn schematic<'a>() -> impl Parser<'a, &'a str, Schematic, extra::Err<Rich<'a, char>>> {
    let hspace = one_of(" \t").repeated();

    let light = choice((just('.').to(false), just('#').to(true)));

    // [.##.]
    let diagram = light
        .repeated()
        .collect::<Vec<bool>>()
        .delimited_by(just('['), just(']'));

    // (0,2,3)
    let wiring = number::<usize>()
        .separated_by(just(','))
        .collect::<Vec<usize>>()
        .delimited_by(just('('), just(')'))
        .map_with(|indices, e| (indices, e.span()));

    // {3,5,4,7}
    let joltage = number::<u64>()
        .separated_by(just(','))
        .collect::<Vec<u64>>()
        .delimited_by(just('{'), just('}'))
        .map_with(|levels, e| (levels, e.span()));

    hspace
        .clone()
        .ignore_then(diagram)
        .then(
            hspace
                .clone()
                .ignore_then(wiring)
                .repeated()
                .collect::<Vec<Wiring>>(),
        )
        .then(hspace.clone().ignore_then(joltage).or_not())
        .then_ignore(hspace)
        .then_ignore(end())
        .try_map(|((lights, wiring), joltage), _| {
            let width = lights.len();

            for (button, (indices, span)) in wiring.iter().enumerate() {
                if let Some(&i) = indices.iter().find(|&&i| i >= width) {
                    return Err(Rich::custom(
                        *span,
                        format!("button {button} uses light {i} but the diagram has {width}"),
                    ));
                }
                let mut seen = vec![false; width];
                for &i in indices {
                    if std::mem::replace(&mut seen[i], true) {
                        return Err(Rich::custom(
                            *span,
                            format!("button {button} lists position {i} twice"),
                        ));
                    }
                }
            }

            let joltage = match joltage {
                Some((levels, span)) if levels.len() != width => {
                    return Err(Rich::custom(
                        span,
                        format!(
                            "{} joltage requirements for a diagram of {width} lights",
                            levels.len()
                        ),
                    ));
                }
                Some((levels, _)) => Some(levels),
                None => None,
            };

            Ok(Schematic {
                lights,
                wiring: wiring.into_iter().map(|(indices, _)| indices).collect(),
                joltage,
            })
        })
}

/// Parses a single manual line. `line` is the 1-based line number used in
/// diagnostics.
pub fn parse_line(line: usize, text: &str) -> Result<Schematic, Error> {
    schematic().parse(text).into_result().map_err(|errors| {
        let (reason, span) = errors
            .first()
            .map(|err| (err.to_string(), *err.span()))
            .unwrap_or_else(|| ("unknown parse failure".to_string(), SimpleSpan::from(0..0)));
        Error::Parse {
            line,
            reason,
            src: NamedSource::new(format!("line {line}"), text.to_string()),
            span: (span.start, span.end - span.start).into(),
        }
    })
}

/// Parses every non-blank line of the manual. Fails on the first bad line.
#[tracing::instrument(skip_all, fields(bytes = input.len()))]
pub fn parse_manual(input: &str) -> Result<Vec<Schematic>, Error> {
    input
        .lines()
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(index, text)| parse_line(index + 1, text))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    const EXAMPLE: &str = "[.##.] (3) (1,3) (2) (2,3) (0,2) (0,1) {3,5,4,7}
[...#.] (0,2,3,4) (2,3) (0,4) (0,1,2) (1,2,3,4) {7,5,12,7,2}
[.###.#] (0,1,2,3,4) (0,3,4) (0,1,2,4,5) (1,2) {10,11,11,5,10,5}";

    #[test]
    fn it_parses_the_manual() -> miette::Result<()> {
        let manual = parse_manual(EXAMPLE)?;
        assert_eq!(manual.len(), 3);

        let first = &manual[0];
        assert_eq!(first.lights, vec![false, true, true, false]);
        assert_eq!(
            first.wiring,
            vec![
                vec![3],
                vec![1, 3],
                vec![2],
                vec![2, 3],
                vec![0, 2],
                vec![0, 1]
            ]
        );
        assert_eq!(first.joltage, Some(vec![3, 5, 4, 7]));
        assert_eq!(manual[2].width(), 6);
        Ok(())
    }

    #[test]
    fn it_builds_both_machines() -> miette::Result<()> {
        let schematic = parse_line(1, "[.##.] (3) (1,3) (2) (2,3) (0,2) (0,1) {3,5,4,7}")?;

        let lights = schematic.indicator_machine()?;
        assert_eq!(lights.button_count(), 6);
        assert_eq!(lights.target().iter_ones().collect::<Vec<_>>(), vec![1, 2]);

        let joltage = schematic.joltage_machine()?;
        assert_eq!(joltage.effect(1), Some(&Counters::new(vec![0, 1, 0, 1])));
        assert_eq!(joltage.target(), &Counters::new(vec![3, 5, 4, 7]));
        Ok(())
    }

    #[test]
    fn joltage_block_is_optional() -> miette::Result<()> {
        let schematic = parse_line(1, "[#] (0)")?;
        assert_eq!(schematic.joltage, None);
        assert!(schematic.indicator_machine().is_ok());
        assert!(matches!(schematic.joltage_machine(), Err(Error::MissingJoltage)));
        Ok(())
    }

    #[test]
    fn accepts_empty_buttons_and_blank_lines() -> miette::Result<()> {
        let manual = parse_manual("\n[##] () (0,1) {1,1}\n\n")?;
        assert_eq!(manual.len(), 1);
        assert_eq!(manual[0].wiring, vec![vec![], vec![0, 1]]);
        Ok(())
    }

    #[test]
    fn round_trips_through_a_machine() -> miette::Result<()> {
        let schematic = parse_line(1, "[.#.] (0,2) (1)")?;
        let machine = schematic.indicator_machine()?;
        assert_eq!(Schematic::from(&machine), schematic);
        Ok(())
    }

    #[rstest]
    #[case::not_a_number("[#.] (0,x) {1,2}")]
    #[case::missing_bracket("[#. (0) {1,2}")]
    #[case::unclosed_button("[#.] (0,1 {1,2}")]
    #[case::index_out_of_range("[#.] (0,2) {1,2}")]
    #[case::duplicate_index("[#.] (1,1) {1,2}")]
    #[case::joltage_width("[#.] (0) {1,2,3}")]
    #[case::negative_joltage("[#.] (0) {1,-2}")]
    #[case::overflow("[#.] (0) {1,99999999999999999999999}")]
    #[case::trailing_garbage("[#.] (0) {1,2} extra")]
    fn rejects_malformed_lines(#[case] input: &str) {
        let result = parse_manual(input);
        assert!(
            matches!(result, Err(Error::Parse { line: 1, .. })),
            "expected a parse error for {input:?}, got {result:?}"
        );
    }

    #[test]
    fn reports_the_offending_line() {
        let input = "[#] (0) {1}\n[#] (0) {1}\n[#] (5) {1}";
        match parse_manual(input) {
            Err(Error::Parse { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected a parse error, got {other:?}"),
        }
    }
}
