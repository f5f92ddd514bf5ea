use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::Serialize;

use super::{catalog, DeviceClass};

/// 元件首字母的含义，A 到 Z 每个字母一个
pub const ELEMENT_LETTERS: [(char, &str); 26] = [
    ('A', "XSPICE code model"),
    ('B', "behavioral (arbitrary) source"),
    ('C', "capacitor"),
    ('D', "diode"),
    ('E', "voltage-controlled voltage source (VCVS)"),
    ('F', "current-controlled current source (CCCs)"),
    ('G', "voltage-controlled current source (VCCS)"),
    ('H', "current-controlled voltage source (CCVS)"),
    ('I', "current source"),
    ('J', "junction field effect transistor (JFET)"),
    ('K', "coupled (mutual) inductors"),
    ('L', "inductor"),
    ('M', "metal oxide field effect transistor (MOSFET)"),
    ('N', "numerical device for GSS"),
    ('O', "lossy transmission line"),
    ('P', "coupled multiconductor line (CPL)"),
    ('Q', "bipolar junction transistor (BJT)"),
    ('R', "resistor"),
    ('S', "switch (voltage-controlled)"),
    ('T', "lossless transmission line"),
    ('U', "uniformly distributed RC line"),
    ('V', "voltage source"),
    ('W', "switch (current-controlled)"),
    ('X', "subcircuit"),
    ('Y', "single lossy transmission line (TXL)"),
    ('Z', "metal semiconductor field effect transistor (MESFET)"),
];

pub fn element_letter_meaning(letter: char) -> Option<&'static str> {
    let letter = letter.to_ascii_uppercase();
    ELEMENT_LETTERS
        .iter()
        .find(|(candidate, _)| *candidate == letter)
        .map(|(_, meaning)| *meaning)
}

/// Everything known about one element letter.
#[derive(Debug, Clone, Serialize)]
pub struct ElementData {
    pub letter: char,
    #[serde(serialize_with = "serialize_class_names")]
    pub classes: Vec<&'static DeviceClass>,
    pub positionals_min: usize,
    pub positionals_max: usize,
    pub has_optionals: bool,
    pub has_flag: bool,
    /// `Q` and `X`.
    pub variable_pins: bool,
    /// Pin count of the first class.
    pub number_of_pins: usize,
}

fn serialize_class_names<S: serde::Serializer>(
    classes: &[&'static DeviceClass],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(classes.iter().map(|class| class.name))
}

impl ElementData {
    fn new(letter: char, classes: Vec<&'static DeviceClass>) -> Self {
        Self {
            letter,
            positionals_min: classes
                .iter()
                .map(|class| class.positional_min())
                .min()
                .unwrap_or(0),
            positionals_max: classes
                .iter()
                .map(|class| class.positional_max())
                .max()
                .unwrap_or(0),
            has_optionals: classes.iter().any(|class| class.has_optionals()),
            has_flag: classes.iter().any(|class| class.has_flag()),
            variable_pins: classes.iter().any(|class| class.has_variable_pins()),
            number_of_pins: classes.first().map_or(0, |class| class.pins.len()),
            classes,
        }
    }

    /// Whether some candidate class declares the bare flag `name`.
    pub fn is_flag(&self, name: &str) -> bool {
        self.classes.iter().any(|class| class.flag(name).is_some())
    }
}

/// 器件注册表
///
/// Built once from a list of classes and never changed afterwards. Parsers
/// take it by reference; [`DeviceRegistry::shared`] is the default instance.
#[derive(Debug, Clone)]
pub struct DeviceRegistry {
    letters: BTreeMap<char, ElementData>,
}

impl DeviceRegistry {
    /// Registry over the built-in device catalog.
    pub fn new() -> Self {
        Self::from_classes(catalog::classes())
    }

    /// Classes sharing a letter are tried in the order given.
    pub fn from_classes(classes: impl IntoIterator<Item = &'static DeviceClass>) -> Self {
        let mut grouped: BTreeMap<char, Vec<&'static DeviceClass>> = BTreeMap::new();
        for class in classes {
            grouped
                .entry(class.letter.to_ascii_uppercase())
                .or_default()
                .push(class);
        }
        let letters = grouped
            .into_iter()
            .map(|(letter, classes)| (letter, ElementData::new(letter, classes)))
            .collect();
        Self { letters }
    }

    pub fn shared() -> &'static DeviceRegistry {
        static SHARED: Lazy<DeviceRegistry> = Lazy::new(DeviceRegistry::new);
        &SHARED
    }

    pub fn get(&self, letter: char) -> Option<&ElementData> {
        self.letters.get(&letter.to_ascii_uppercase())
    }

    pub fn letters(&self) -> impl Iterator<Item = &ElementData> {
        self.letters.values()
    }

    pub fn class(&self, name: &str) -> Option<&'static DeviceClass> {
        self.letters
            .values()
            .flat_map(|data| data.classes.iter().copied())
            .find(|class| class.name == name)
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letters() {
        assert_eq!(element_letter_meaning('r'), Some("resistor"));
        assert_eq!(element_letter_meaning('X'), Some("subcircuit"));
        assert_eq!(element_letter_meaning('9'), None);
        assert!(ELEMENT_LETTERS
            .iter()
            .zip('A'..='Z')
            .all(|((letter, _), expected)| *letter == expected));
    }

    #[test]
    fn test_registry() {
        let registry = DeviceRegistry::shared();
        let data = registry.get('r').unwrap();
        assert_eq!(data.letter, 'R');
        assert_eq!(data.classes[0].name, "Resistor");
        assert_eq!(data.number_of_pins, 2);
        assert_eq!(data.positionals_min, 1);
        assert!(!data.variable_pins);

        let data = registry.get('Q').unwrap();
        assert!(data.variable_pins);
        assert!(data.has_flag);
        assert!(data.is_flag("OFF"));

        assert!(registry.get('X').unwrap().variable_pins);
        for letter in ['A', 'N', 'P'] {
            assert!(registry.get(letter).is_none());
        }
        assert!(registry.class("Mosfet").is_some());
    }

    #[test]
    fn test_custom_registry() {
        let registry = DeviceRegistry::from_classes(catalog::classes().into_iter().filter(|class| class.letter == 'R'));
        assert!(registry.get('C').is_none());
        assert_eq!(registry.get('R').unwrap().classes.len(), 3);
        assert_eq!(registry.letters().count(), 1);
    }
}
