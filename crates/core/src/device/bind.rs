//! 元件行绑定
//!
//! Turns a parsed `Command` into an [`Element`]: pick the device class for
//! the letter, read the node slots, coerce positional, keyword and flag
//! parameters against the class descriptors.

use crate::{
    ast::{Ast, GroupKind},
    config::ParserOptions,
    device::{
        element_letter_meaning, DeviceClass, ElementData, DeviceRegistry, Element,
        ParameterValue,
    },
    error::{SpiceError, SpiceResult},
    parse::parse_expression,
};

/// A class with its node slots already split off.
struct Candidate<'a> {
    class: &'static DeviceClass,
    nodes: Vec<String>,
    positionals: Vec<&'a Ast>,
    flags: Vec<&'static str>,
    raw: Vec<String>,
}

#[derive(Clone, Copy)]
struct Attempt {
    strict: bool,
    allow_extra: bool,
}

/// Node name of a pin slot: a leaf, or a bracket holding a single leaf.
fn node_name(ast: &Ast) -> Option<String> {
    match ast {
        Ast::Group {
            kind: GroupKind::Bracket,
            inner,
        } => match inner.as_ref() {
            Ast::List { items, .. } if items.len() == 1 => items[0].leaf_text(),
            _ => None,
        },
        _ => ast.leaf_text(),
    }
}

fn pin_count_error(class: &DeviceClass, reference: &str, found: usize) -> SpiceError {
    let expected = if class.variadic_pins {
        format!("at least {}", class.required_pins().max(1))
    } else if class.max_pins() > class.required_pins() {
        format!("{} to {}", class.required_pins(), class.max_pins())
    } else {
        class.required_pins().to_string()
    };
    SpiceError::PinCount {
        device: class.name.to_string(),
        element: reference.to_string(),
        expected,
        found,
    }
}

fn read_nodes(class: &DeviceClass, reference: &str, slots: &[Ast]) -> SpiceResult<Vec<String>> {
    slots
        .iter()
        .map(node_name)
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| {
            let found = slots.iter().take_while(|slot| node_name(slot).is_some()).count();
            pin_count_error(class, reference, found)
        })
}

impl<'a> Candidate<'a> {
    /// Splits `head` (children before the first `key=value`) into node
    /// slots and positional values for `class`.
    fn new(
        class: &'static DeviceClass,
        data: &ElementData,
        reference: &str,
        head: &'a [Ast],
        trailing: &[&'a Ast],
    ) -> SpiceResult<Self> {
        let is_flag = |ast: &Ast| ast.as_id().is_some_and(|id| class.flag(id).is_some());

        let pins = if class.variadic_pins {
            // nodes, then the subcircuit name
            if head.len() < 2 {
                return Err(pin_count_error(class, reference, head.len().saturating_sub(1)));
            }
            head.len() - 1
        } else if class.has_variable_pins() {
            // the model is the last name that is not a flag
            let model = head
                .iter()
                .rposition(|ast| ast.as_id().is_some() && !is_flag(ast))
                .or_else(|| head.iter().rposition(|ast| !is_flag(ast)))
                .unwrap_or(0);
            if model < class.required_pins() || model > class.max_pins() {
                return Err(pin_count_error(class, reference, model));
            }
            model
        } else {
            if head.len() < class.pins.len() {
                let found = head.iter().take_while(|slot| node_name(slot).is_some()).count();
                return Err(pin_count_error(class, reference, found));
            }
            class.pins.len()
        };

        let nodes = read_nodes(class, reference, &head[..pins])?;

        let mut candidate = Candidate {
            class,
            nodes,
            positionals: Vec::new(),
            flags: Vec::new(),
            raw: Vec::new(),
        };
        for ast in head[pins..].iter().chain(trailing.iter().copied()) {
            match ast.as_id().map(|id| (id, class.flag(id))) {
                Some((_, Some(flag))) => candidate.flags.push(flag.attribute),
                Some((id, None)) if data.is_flag(id) => {
                    log::warn!("{}: flag `{}' is not supported by {}", reference, id, class.name);
                    candidate.raw.push(id.to_string());
                }
                _ => candidate.positionals.push(ast),
            }
        }
        Ok(candidate)
    }

    fn in_range(&self) -> bool {
        (self.class.positional_min()..=self.class.positional_max()).contains(&self.positionals.len())
    }

    fn is_exact(&self) -> bool {
        self.positionals.len() == self.class.positional_max()
    }

    fn bind(&self, letter: char, name: &str, sets: &[&Ast], attempt: Attempt) -> SpiceResult<Element> {
        let class = self.class;
        let reference = format!("{}{}", letter, name);
        let descriptors = class.positionals();
        let mut values: Vec<(&'static str, ParameterValue)> = Vec::new();
        let mut raw = self.raw.clone();
        let mut overrides = Vec::new();

        // a bare name no slot accepts is an unknown flag
        let mut unknown = Vec::new();
        let mut positionals = Vec::with_capacity(self.positionals.len());
        for ast in self.positionals.iter().copied() {
            let rejected = !class.merge_trailing
                && ast.as_id().is_some()
                && descriptors
                    .get(positionals.len())
                    .map_or(true, |descriptor| descriptor.coercion.coerce(ast, attempt.strict).is_err());
            if rejected {
                unknown.push(ast.to_string());
            } else {
                positionals.push(ast);
            }
        }

        let given = positionals.len();
        if given < class.positional_min() {
            let missing = descriptors
                .get(given)
                .map_or("parameter", |descriptor| descriptor.attribute);
            return Err(SpiceError::parameter(
                class.name,
                missing,
                &reference,
                "missing required parameter",
            ));
        }
        if given > descriptors.len() && !attempt.allow_extra {
            return Err(SpiceError::parameter(
                class.name,
                "positional",
                positionals[descriptors.len()],
                "unexpected positional parameter",
            ));
        }

        let merge = attempt.allow_extra
            && class.merge_trailing
            && !descriptors.is_empty()
            && given >= descriptors.len();
        let direct = if merge { descriptors.len() - 1 } else { descriptors.len() };

        for (descriptor, ast) in descriptors.iter().zip(&positionals).take(direct) {
            let value = descriptor
                .coercion
                .coerce(ast, attempt.strict)
                .map_err(|reason| SpiceError::parameter(class.name, descriptor.attribute, ast, reason))?;
            values.push((descriptor.attribute, value));
        }

        if merge {
            let last = descriptors[direct];
            let rest = &positionals[direct..];
            let value = match rest {
                [single] => last.coercion.coerce(single, false).ok(),
                _ => None,
            }
            .unwrap_or_else(|| {
                ParameterValue::Expression(
                    rest.iter().map(ToString::to_string).collect::<Vec<_>>().join(" "),
                )
            });
            values.push((last.attribute, value));
        } else {
            raw.extend(positionals.iter().skip(direct).map(ToString::to_string));
        }

        for flag in &self.flags {
            values.push((*flag, ParameterValue::Bool(true)));
        }

        for set in sets {
            let (key, value) = match set {
                Ast::Set { key, value } => (key, value),
                _ => continue,
            };
            let key = match key.as_ref() {
                Ast::Id(name) => name.clone(),
                other => other.to_string(),
            };
            match class.keyword(&key) {
                Some(descriptor) => {
                    let value = descriptor
                        .coercion
                        .coerce(value, false)
                        .map_err(|reason| SpiceError::parameter(class.name, &key, set, reason))?;
                    values.retain(|(attribute, _)| *attribute != descriptor.attribute);
                    values.push((descriptor.attribute, value));
                }
                None if class.open_keywords => overrides.push((key, value.as_ref().clone())),
                None => {
                    return Err(SpiceError::parameter(class.name, &key, set, "unknown keyword"));
                }
            }
        }

        for descriptor in class.parameters {
            let Some(default) = descriptor.default else {
                continue;
            };
            if values.iter().any(|(attribute, _)| *attribute == descriptor.attribute) {
                continue;
            }
            let value = parse_expression(default)
                .map_err(|error| error.to_string())
                .and_then(|ast| descriptor.coercion.coerce(&ast, false))
                .map_err(|reason| SpiceError::parameter(class.name, descriptor.attribute, default, reason))?;
            values.push((descriptor.attribute, value));
        }

        values.sort_by_key(|(attribute, _)| {
            class
                .parameters
                .iter()
                .position(|descriptor| descriptor.attribute == *attribute)
        });

        for id in &unknown {
            log::warn!("{}: `{}' is not a parameter of {}", reference, id, class.name);
        }
        raw.extend(unknown);
        if !raw.is_empty() {
            log::debug!("{}: unparsed trailing text `{}'", reference, raw.join(" "));
        }

        Ok(Element {
            letter,
            name: name.to_string(),
            class,
            nodes: self.nodes.clone(),
            parameters: values,
            overrides,
            raw,
        })
    }
}

/// `TABLE {expr} = (x, y) ...` binds as the keyword before the brace.
fn fold_table(children: &[Ast]) -> Vec<Ast> {
    let mut folded: Vec<Ast> = Vec::with_capacity(children.len());
    for child in children {
        let brace_key = matches!(
            child,
            Ast::Set { key, .. } if matches!(key.as_ref(), Ast::Group { kind: GroupKind::Brace, .. })
        );
        if brace_key && matches!(folded.last(), Some(Ast::Id(_))) {
            if let Some(keyword) = folded.pop() {
                folded.push(Ast::Set {
                    key: Box::new(keyword),
                    value: Box::new(child.clone()),
                });
                continue;
            }
        }
        folded.push(child.clone());
    }
    folded
}

/// 绑定一条元件行
///
/// Classes registered for the letter are tried in order: first one whose
/// positional count matches exactly with strict coercion, then any in range,
/// then lenient coercion. As a last resort the first class whose node slots
/// fit takes the line with surplus values kept as raw text.
pub fn bind_element(
    ast: &Ast,
    registry: &DeviceRegistry,
    options: &ParserOptions,
) -> SpiceResult<Element> {
    let reference = ast.command_name().ok_or_else(|| SpiceError::Syntax {
        reason: "element line without a name".to_string(),
        position: None,
    })?;
    let mut chars = reference.chars();
    let letter = chars.next().map(|c| c.to_ascii_uppercase()).unwrap_or(' ');
    let name = chars.as_str();

    let data = registry.get(letter).ok_or_else(|| SpiceError::ElementLetter {
        letter,
        meaning: element_letter_meaning(letter)
            .unwrap_or("not a device letter")
            .to_string(),
    })?;

    let children = fold_table(ast.children());
    let split = children.iter().position(Ast::is_set).unwrap_or(children.len());
    let (head, tail) = children.split_at(split);
    let sets = tail.iter().filter(|ast| ast.is_set()).collect::<Vec<_>>();
    let trailing = tail.iter().filter(|ast| !ast.is_set()).collect::<Vec<_>>();

    let mut pin_error = None;
    let mut candidates = Vec::new();
    for class in data.classes.iter().copied() {
        match Candidate::new(class, data, reference, head, &trailing) {
            Ok(candidate) => candidates.push(candidate),
            Err(error) => {
                pin_error.get_or_insert(error);
            }
        }
    }
    let Some(fallback) = candidates.first() else {
        return Err(pin_error.unwrap_or_else(|| SpiceError::ElementLetter {
            letter,
            meaning: "no device class".to_string(),
        }));
    };

    let strict = Attempt {
        strict: true,
        allow_extra: false,
    };
    let lenient = Attempt {
        strict: false,
        allow_extra: false,
    };
    // (attempt, exact positional count only)
    let passes = [(strict, true), (strict, false), (lenient, false)];

    let mut element = None;
    'passes: for (attempt, exact) in passes {
        for candidate in candidates
            .iter()
            .filter(|candidate| candidate.in_range() && (!exact || candidate.is_exact()))
        {
            if let Ok(bound) = candidate.bind(letter, name, &sets, attempt) {
                element = Some(bound);
                break 'passes;
            }
        }
    }
    let mut element = match element {
        Some(element) => element,
        None => fallback.bind(
            letter,
            name,
            &sets,
            Attempt {
                strict: false,
                allow_extra: true,
            },
        )?,
    };

    for node in &mut element.nodes {
        if node.eq_ignore_ascii_case(&options.ground) {
            *node = "0".to_string();
        }
    }
    log::debug!("{} bound to {}", reference, element.class.name);
    Ok(element)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        device::{catalog::*, Device},
        parse::parse_line,
    };

    fn bind(line: &str) -> SpiceResult<Element> {
        bind_element(
            &parse_line(line).unwrap(),
            DeviceRegistry::shared(),
            &ParserOptions::default(),
        )
    }

    #[test]
    fn test_resistor() {
        let element = bind("R1 1 2 1k").unwrap();
        assert_eq!(element.letter, 'R');
        assert_eq!(element.name, "1");
        assert_eq!(element.nodes, ["1", "2"]);
        assert_eq!(element.class.name, "Resistor");
        assert_eq!(element.value("resistance"), Some(&ParameterValue::Float(1000.)));

        let resistor = Resistor::from_element(&element).unwrap();
        assert_eq!(resistor.resistance, ParameterValue::Float(1000.));
        assert_eq!(resistor.multiplier, None);
        assert!(Capacitor::from_element(&element).is_err());

        let element = bind("R2 a b 10k rmod l=2u").unwrap();
        assert_eq!(element.class.name, "SemiconductorResistor");
        assert_eq!(element.model(), Some("rmod"));

        let element = bind("R3 a b {rval*2} tc1=0.01").unwrap();
        assert_eq!(element.class.name, "BehavioralResistor");
        assert_eq!(
            element.value("resistance_expression"),
            Some(&ParameterValue::Expression("{rval * 2}".to_string()))
        );
    }

    #[test]
    fn test_element_letter() {
        assert!(matches!(
            bind("9R1 1 2 1k"),
            Err(SpiceError::ElementLetter { letter: '9', .. })
        ));
        assert!(matches!(
            bind("A1 1 2 amod"),
            Err(SpiceError::ElementLetter { letter: 'A', .. })
        ));
    }

    #[test]
    fn test_bjt_pins() {
        assert!(matches!(bind("Q1 1 2 QMOD"), Err(SpiceError::PinCount { found: 2, .. })));

        let element = bind("Q1 c b e QMOD").unwrap();
        assert_eq!(element.nodes, ["c", "b", "e"]);
        assert_eq!(element.model(), Some("QMOD"));

        let element = bind("Q2 c b e s QMOD 1.5").unwrap();
        assert_eq!(element.nodes.len(), 4);
        assert_eq!(element.value("area"), Some(&ParameterValue::Float(1.5)));

        let element = bind("Q3 c b e s t QMOD off").unwrap();
        assert_eq!(element.nodes, ["c", "b", "e", "s", "t"]);
        assert!(element.flag("off"));
        let bjt = BipolarJunctionTransistor::from_element(&element).unwrap();
        assert!(bjt.off);
        assert_eq!(bjt.model, Some(ParameterValue::Text("QMOD".to_string())));

        assert!(matches!(
            bind("Q4 1 2 3 4 5 6 QMOD"),
            Err(SpiceError::PinCount { found: 6, .. })
        ));
    }

    #[test]
    fn test_subcircuit_instance() {
        let element = bind("X1 in out vdd opamp gain=10").unwrap();
        assert_eq!(element.nodes, ["in", "out", "vdd"]);
        assert_eq!(element.model(), Some("opamp"));
        assert_eq!(element.overrides, [("gain".to_string(), Ast::Integer(10))]);

        let instance = SubCircuitElement::from_element(&element).unwrap();
        assert_eq!(instance.subcircuit_name, ParameterValue::Text("opamp".to_string()));

        assert!(matches!(bind("X1 opamp"), Err(SpiceError::PinCount { .. })));
    }

    #[test]
    fn test_keywords_and_flags() {
        let element = bind("D1 a k dmod off ic=0.6, 5").unwrap();
        assert!(element.flag("off"));
        assert_eq!(
            element.value("ic"),
            Some(&ParameterValue::List(vec![
                ParameterValue::Float(0.6),
                ParameterValue::Float(5.)
            ]))
        );

        let element = bind("M1 d g s b nmos W=2u L=1u").unwrap();
        assert_eq!(element.value("width"), Some(&ParameterValue::Float(2e-6)));
        // declared default
        assert_eq!(element.value("multiplier"), Some(&ParameterValue::Int(1)));

        assert!(matches!(
            bind("R1 1 2 1k foo=3"),
            Err(SpiceError::Parameter { parameter, .. }) if parameter == "foo"
        ));
        assert!(matches!(
            bind("C1 1 2 1p ic=abc"),
            Err(SpiceError::Parameter { .. })
        ));

        // surplus positionals are kept as text
        let element = bind("D1 a k dmod 2 extra").unwrap();
        assert_eq!(element.value("area"), Some(&ParameterValue::Float(2.)));
        assert_eq!(element.raw, ["extra"]);
    }

    #[test]
    fn test_unknown_flag_in_optional_slot() {
        let element = bind("D1 a k dmod foo").unwrap();
        assert_eq!(element.class.name, "Diode");
        assert_eq!(element.model(), Some("dmod"));
        assert_eq!(element.value("area"), None);
        assert_eq!(element.raw, ["foo"]);

        let element = bind("D2 a k dmod foo 2 m=3").unwrap();
        assert_eq!(element.value("area"), Some(&ParameterValue::Float(2.)));
        assert_eq!(element.value("multiplier"), Some(&ParameterValue::Int(3)));
        assert_eq!(element.raw, ["foo"]);

        // a name is still taken where the slot accepts one
        let element = bind("R1 1 2 rval").unwrap();
        assert_eq!(element.class.name, "BehavioralResistor");
        assert!(element.raw.is_empty());

        let netlist = crate::parse_netlist("t\nD1 a k dmod foo\n.end\n").unwrap();
        assert!(netlist.diagnostics.is_empty());
        assert_eq!(netlist.elements().count(), 1);
    }

    #[test]
    fn test_sources() {
        let element = bind("V1 in 0 5").unwrap();
        assert_eq!(element.value("dc_value"), Some(&ParameterValue::Float(5.)));

        let element = bind("V2 in 0 DC 5 AC 1").unwrap();
        assert_eq!(
            element.value("dc_value"),
            Some(&ParameterValue::Expression("DC 5 AC 1".to_string()))
        );

        let element = bind("I1 0 n1 SIN(0 1m 1k)").unwrap();
        assert_eq!(
            element.value("dc_value"),
            Some(&ParameterValue::Expression("SIN(0 1m 1k)".to_string()))
        );

        let element = bind("E1 out 0 value={v(in)*2}").unwrap();
        assert_eq!(element.class.name, "NonLinearVoltageSource");

        let element = bind("E3 out 0 TABLE {V(in)} = (0,0) (1,2)").unwrap();
        assert_eq!(element.class.name, "NonLinearVoltageSource");
        assert_eq!(element.nodes, ["out", "0"]);
        assert_eq!(
            element.value("table"),
            Some(&ParameterValue::Expression("{V(in)}=(0, 0) (1, 2)".to_string()))
        );
        assert!(element.raw.is_empty());
        let source = NonLinearVoltageSource::from_element(&element).unwrap();
        assert!(source.table.is_some());
        assert!(source.expression.is_none());

        let element = bind("E2 3 0 5 0 10").unwrap();
        assert_eq!(element.class.name, "VoltageControlledVoltageSource");

        let element = bind("B1 out 0 v={V(in)*2}").unwrap();
        assert!(element.value("voltage_expression").is_some());

        let element = bind("K1 L1 L2 0.99").unwrap();
        assert!(element.nodes.is_empty());
        assert_eq!(element.value("coupling_factor"), Some(&ParameterValue::Float(0.99)));
    }

    #[test]
    fn test_ground_substitution() {
        let options = ParserOptions {
            ground: "gnd".to_string(),
            ..ParserOptions::default()
        };
        let element =
            bind_element(&parse_line("C1 out GND 1p").unwrap(), DeviceRegistry::shared(), &options)
                .unwrap();
        assert_eq!(element.nodes, ["out", "0"]);
    }
}
