//! 内置器件库
//!
//! One struct per device class. Classes sharing a letter are listed in the
//! order they are tried when binding an element line.

use spice_proc_macro::Device;

use crate::{
    ast::Ast,
    device::{
        Coercion, Device, DeviceClass, Element, ParameterDescriptor, ParameterKind,
        ParameterValue, PinDefinition,
    },
    error::{SpiceError, SpiceResult},
};

/// `Xxxx n1 n2 ... subckt [name=value ...]`
#[derive(Debug, Clone, PartialEq, Device)]
#[device(letter = 'X', variadic_pins, open_keywords)]
pub struct SubCircuitElement {
    pub name: String,
    pub nodes: Vec<String>,
    #[parameter(position = 0, coerce = "element_name")]
    pub subcircuit_name: ParameterValue,
    pub overrides: Vec<(String, Ast)>,
}

#[derive(Debug, Clone, PartialEq, Device)]
#[device(letter = 'R', pins("plus", "minus"))]
pub struct Resistor {
    pub name: String,
    pub nodes: Vec<String>,
    #[parameter(position = 0, coerce = "float")]
    pub resistance: ParameterValue,
    #[parameter(keyword, coerce = "float")]
    pub ac: Option<ParameterValue>,
    #[parameter(keyword = "m", coerce = "int")]
    pub multiplier: Option<ParameterValue>,
    #[parameter(keyword, coerce = "float")]
    pub scale: Option<ParameterValue>,
    #[parameter(keyword = "temp", coerce = "float")]
    pub temperature: Option<ParameterValue>,
    #[parameter(keyword = "dtemp", coerce = "float")]
    pub device_temperature: Option<ParameterValue>,
    #[parameter(keyword, coerce = "bool")]
    pub noisy: Option<ParameterValue>,
}

#[derive(Debug, Clone, PartialEq, Device)]
#[device(letter = 'R', pins("plus", "minus"))]
pub struct SemiconductorResistor {
    pub name: String,
    pub nodes: Vec<String>,
    #[parameter(position = 0, coerce = "float")]
    pub resistance: ParameterValue,
    #[parameter(position = 1, key_parameter, coerce = "model")]
    pub model: Option<ParameterValue>,
    #[parameter(keyword = "l", coerce = "float")]
    pub length: Option<ParameterValue>,
    #[parameter(keyword = "w", coerce = "float")]
    pub width: Option<ParameterValue>,
    #[parameter(keyword = "temp", coerce = "float")]
    pub temperature: Option<ParameterValue>,
    #[parameter(keyword = "dtemp", coerce = "float")]
    pub device_temperature: Option<ParameterValue>,
    #[parameter(keyword = "m", coerce = "int")]
    pub multiplier: Option<ParameterValue>,
    #[parameter(keyword, coerce = "float")]
    pub ac: Option<ParameterValue>,
    #[parameter(keyword, coerce = "float")]
    pub scale: Option<ParameterValue>,
    #[parameter(keyword, coerce = "bool")]
    pub noisy: Option<ParameterValue>,
}

#[derive(Debug, Clone, PartialEq, Device)]
#[device(letter = 'R', pins("plus", "minus"))]
pub struct BehavioralResistor {
    pub name: String,
    pub nodes: Vec<String>,
    #[parameter(position = 0, coerce = "expression")]
    pub resistance_expression: ParameterValue,
    #[parameter(keyword, coerce = "float")]
    pub tc1: Option<ParameterValue>,
    #[parameter(keyword, coerce = "float")]
    pub tc2: Option<ParameterValue>,
}

#[derive(Debug, Clone, PartialEq, Device)]
#[device(letter = 'C', pins("plus", "minus"))]
pub struct Capacitor {
    pub name: String,
    pub nodes: Vec<String>,
    #[parameter(position = 0, coerce = "float")]
    pub capacitance: ParameterValue,
    #[parameter(keyword = "m", coerce = "int")]
    pub multiplier: Option<ParameterValue>,
    #[parameter(keyword, coerce = "float")]
    pub scale: Option<ParameterValue>,
    #[parameter(keyword = "temp", coerce = "float")]
    pub temperature: Option<ParameterValue>,
    #[parameter(keyword = "dtemp", coerce = "float")]
    pub device_temperature: Option<ParameterValue>,
    #[parameter(keyword = "ic", coerce = "float")]
    pub initial_condition: Option<ParameterValue>,
}

#[derive(Debug, Clone, PartialEq, Device)]
#[device(letter = 'C', pins("plus", "minus"))]
pub struct SemiconductorCapacitor {
    pub name: String,
    pub nodes: Vec<String>,
    #[parameter(position = 0, coerce = "float")]
    pub capacitance: ParameterValue,
    #[parameter(position = 1, key_parameter, coerce = "model")]
    pub model: Option<ParameterValue>,
    #[parameter(keyword = "l", coerce = "float")]
    pub length: Option<ParameterValue>,
    #[parameter(keyword = "w", coerce = "float")]
    pub width: Option<ParameterValue>,
    #[parameter(keyword = "m", coerce = "int")]
    pub multiplier: Option<ParameterValue>,
    #[parameter(keyword, coerce = "float")]
    pub scale: Option<ParameterValue>,
    #[parameter(keyword = "temp", coerce = "float")]
    pub temperature: Option<ParameterValue>,
    #[parameter(keyword = "dtemp", coerce = "float")]
    pub device_temperature: Option<ParameterValue>,
    #[parameter(keyword = "ic", coerce = "float")]
    pub initial_condition: Option<ParameterValue>,
}

#[derive(Debug, Clone, PartialEq, Device)]
#[device(letter = 'C', pins("plus", "minus"))]
pub struct BehavioralCapacitor {
    pub name: String,
    pub nodes: Vec<String>,
    #[parameter(position = 0, coerce = "expression")]
    pub capacitance_expression: ParameterValue,
    #[parameter(keyword, coerce = "float")]
    pub tc1: Option<ParameterValue>,
    #[parameter(keyword, coerce = "float")]
    pub tc2: Option<ParameterValue>,
}

#[derive(Debug, Clone, PartialEq, Device)]
#[device(letter = 'L', pins("plus", "minus"))]
pub struct Inductor {
    pub name: String,
    pub nodes: Vec<String>,
    #[parameter(position = 0, coerce = "float")]
    pub inductance: ParameterValue,
    #[parameter(position = 1, key_parameter, coerce = "model")]
    pub model: Option<ParameterValue>,
    #[parameter(keyword, coerce = "float")]
    pub nt: Option<ParameterValue>,
    #[parameter(keyword = "m", coerce = "int")]
    pub multiplier: Option<ParameterValue>,
    #[parameter(keyword, coerce = "float")]
    pub scale: Option<ParameterValue>,
    #[parameter(keyword = "temp", coerce = "float")]
    pub temperature: Option<ParameterValue>,
    #[parameter(keyword = "dtemp", coerce = "float")]
    pub device_temperature: Option<ParameterValue>,
    #[parameter(keyword = "ic", coerce = "float")]
    pub initial_condition: Option<ParameterValue>,
}

#[derive(Debug, Clone, PartialEq, Device)]
#[device(letter = 'L', pins("plus", "minus"))]
pub struct BehavioralInductor {
    pub name: String,
    pub nodes: Vec<String>,
    #[parameter(position = 0, coerce = "expression")]
    pub inductance_expression: ParameterValue,
    #[parameter(keyword, coerce = "float")]
    pub tc1: Option<ParameterValue>,
    #[parameter(keyword, coerce = "float")]
    pub tc2: Option<ParameterValue>,
}

/// `Kxxx L1 L2 k`
#[derive(Debug, Clone, PartialEq, Device)]
#[device(letter = 'K')]
pub struct CoupledInductor {
    pub name: String,
    #[parameter(position = 0, coerce = "element_name")]
    pub inductor1: ParameterValue,
    #[parameter(position = 1, coerce = "element_name")]
    pub inductor2: ParameterValue,
    #[parameter(position = 2, coerce = "float")]
    pub coupling_factor: ParameterValue,
}

#[derive(Debug, Clone, PartialEq, Device)]
#[device(
    letter = 'S',
    pins("output_plus", "output_minus", "input_plus", "input_minus")
)]
pub struct VoltageControlledSwitch {
    pub name: String,
    pub nodes: Vec<String>,
    #[parameter(position = 0, key_parameter, coerce = "model")]
    pub model: Option<ParameterValue>,
    #[parameter(position = 1, key_parameter, coerce = "initial_state")]
    pub initial_state: Option<ParameterValue>,
}

#[derive(Debug, Clone, PartialEq, Device)]
#[device(letter = 'W', pins("plus", "minus"))]
pub struct CurrentControlledSwitch {
    pub name: String,
    pub nodes: Vec<String>,
    #[parameter(position = 0, key_parameter, coerce = "element_name")]
    pub source: Option<ParameterValue>,
    #[parameter(position = 1, key_parameter, coerce = "model")]
    pub model: Option<ParameterValue>,
    #[parameter(position = 2, key_parameter, coerce = "initial_state")]
    pub initial_state: Option<ParameterValue>,
}

#[derive(Debug, Clone, PartialEq, Device)]
#[device(letter = 'V', pins("plus", "minus"), merge_trailing)]
pub struct VoltageSource {
    pub name: String,
    pub nodes: Vec<String>,
    #[parameter(position = 0, coerce = "float")]
    pub dc_value: ParameterValue,
}

#[derive(Debug, Clone, PartialEq, Device)]
#[device(letter = 'I', pins("plus", "minus"), merge_trailing)]
pub struct CurrentSource {
    pub name: String,
    pub nodes: Vec<String>,
    #[parameter(position = 0, coerce = "float")]
    pub dc_value: ParameterValue,
}

#[derive(Debug, Clone, PartialEq, Device)]
#[device(
    letter = 'E',
    pins("output_plus", "output_minus", "input_plus", "input_minus")
)]
pub struct VoltageControlledVoltageSource {
    pub name: String,
    pub nodes: Vec<String>,
    #[parameter(position = 0, coerce = "expression")]
    pub voltage_gain: ParameterValue,
}

/// `Exxx n+ n- value={expr}` or `Exxx n+ n- TABLE {expr} = (x, y) ...`
#[derive(Debug, Clone, PartialEq, Device)]
#[device(letter = 'E', pins("plus", "minus"))]
pub struct NonLinearVoltageSource {
    pub name: String,
    pub nodes: Vec<String>,
    #[parameter(keyword = "value", coerce = "expression")]
    pub expression: Option<ParameterValue>,
    #[parameter(keyword, coerce = "expression")]
    pub table: Option<ParameterValue>,
    pub raw: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Device)]
#[device(letter = 'F', pins("plus", "minus"))]
pub struct CurrentControlledCurrentSource {
    pub name: String,
    pub nodes: Vec<String>,
    #[parameter(position = 0, key_parameter, coerce = "element_name")]
    pub source: Option<ParameterValue>,
    #[parameter(position = 1, coerce = "expression")]
    pub current_gain: ParameterValue,
}

#[derive(Debug, Clone, PartialEq, Device)]
#[device(
    letter = 'G',
    pins("output_plus", "output_minus", "input_plus", "input_minus")
)]
pub struct VoltageControlledCurrentSource {
    pub name: String,
    pub nodes: Vec<String>,
    #[parameter(position = 0, coerce = "expression")]
    pub transconductance: ParameterValue,
}

#[derive(Debug, Clone, PartialEq, Device)]
#[device(letter = 'H', pins("plus", "minus"))]
pub struct CurrentControlledVoltageSource {
    pub name: String,
    pub nodes: Vec<String>,
    #[parameter(position = 0, key_parameter, coerce = "element_name")]
    pub source: Option<ParameterValue>,
    #[parameter(position = 1, coerce = "expression")]
    pub transresistance: ParameterValue,
}

/// `Bxxx n+ n- i=expr` or `v=expr`
#[derive(Debug, Clone, PartialEq, Device)]
#[device(letter = 'B', pins("plus", "minus"))]
pub struct BehavioralSource {
    pub name: String,
    pub nodes: Vec<String>,
    #[parameter(keyword = "i", coerce = "expression")]
    pub current_expression: Option<ParameterValue>,
    #[parameter(keyword = "v", coerce = "expression")]
    pub voltage_expression: Option<ParameterValue>,
    #[parameter(keyword, coerce = "float")]
    pub tc1: Option<ParameterValue>,
    #[parameter(keyword, coerce = "float")]
    pub tc2: Option<ParameterValue>,
    #[parameter(keyword = "temp", coerce = "float")]
    pub temperature: Option<ParameterValue>,
    #[parameter(keyword = "dtemp", coerce = "float")]
    pub device_temperature: Option<ParameterValue>,
}

#[derive(Debug, Clone, PartialEq, Device)]
#[device(letter = 'D', pins("anode", "cathode"))]
pub struct Diode {
    pub name: String,
    pub nodes: Vec<String>,
    #[parameter(position = 0, key_parameter, coerce = "model")]
    pub model: Option<ParameterValue>,
    #[parameter(position = 1, key_parameter, coerce = "float")]
    pub area: Option<ParameterValue>,
    #[parameter(keyword = "m", coerce = "int")]
    pub multiplier: Option<ParameterValue>,
    #[parameter(keyword, coerce = "float")]
    pub pj: Option<ParameterValue>,
    #[parameter(flag = "off")]
    pub off: bool,
    #[parameter(keyword, coerce = "float_pair")]
    pub ic: Option<ParameterValue>,
    #[parameter(keyword = "temp", coerce = "float")]
    pub temperature: Option<ParameterValue>,
    #[parameter(keyword = "dtemp", coerce = "float")]
    pub device_temperature: Option<ParameterValue>,
}

/// `Qxxx nc nb ne [ns] [tj] model [area] [off]`
#[derive(Debug, Clone, PartialEq, Device)]
#[device(
    letter = 'Q',
    pins("collector", "base", "emitter"),
    optional_pins("substrate", "thermal")
)]
pub struct BipolarJunctionTransistor {
    pub name: String,
    pub nodes: Vec<String>,
    #[parameter(position = 0, key_parameter, coerce = "model")]
    pub model: Option<ParameterValue>,
    #[parameter(position = 1, key_parameter, coerce = "float")]
    pub area: Option<ParameterValue>,
    #[parameter(keyword, coerce = "float")]
    pub areac: Option<ParameterValue>,
    #[parameter(keyword, coerce = "float")]
    pub areab: Option<ParameterValue>,
    #[parameter(keyword = "m", coerce = "int")]
    pub multiplier: Option<ParameterValue>,
    #[parameter(flag = "off")]
    pub off: bool,
    #[parameter(keyword, coerce = "float_pair")]
    pub ic: Option<ParameterValue>,
    #[parameter(keyword = "temp", coerce = "float")]
    pub temperature: Option<ParameterValue>,
    #[parameter(keyword = "dtemp", coerce = "float")]
    pub device_temperature: Option<ParameterValue>,
}

#[derive(Debug, Clone, PartialEq, Device)]
#[device(letter = 'J', pins("drain", "gate", "source"))]
pub struct JunctionFieldEffectTransistor {
    pub name: String,
    pub nodes: Vec<String>,
    #[parameter(position = 0, key_parameter, coerce = "model")]
    pub model: Option<ParameterValue>,
    #[parameter(position = 1, key_parameter, coerce = "float")]
    pub area: Option<ParameterValue>,
    #[parameter(keyword = "m", coerce = "int")]
    pub multiplier: Option<ParameterValue>,
    #[parameter(flag = "off")]
    pub off: bool,
    #[parameter(keyword, coerce = "float_pair")]
    pub ic: Option<ParameterValue>,
    #[parameter(keyword = "temp", coerce = "float")]
    pub temperature: Option<ParameterValue>,
}

#[derive(Debug, Clone, PartialEq, Device)]
#[device(letter = 'Z', pins("drain", "gate", "source"))]
pub struct Mesfet {
    pub name: String,
    pub nodes: Vec<String>,
    #[parameter(position = 0, key_parameter, coerce = "model")]
    pub model: Option<ParameterValue>,
    #[parameter(position = 1, key_parameter, coerce = "float")]
    pub area: Option<ParameterValue>,
    #[parameter(keyword = "m", coerce = "int")]
    pub multiplier: Option<ParameterValue>,
    #[parameter(flag = "off")]
    pub off: bool,
    #[parameter(keyword, coerce = "float_pair")]
    pub ic: Option<ParameterValue>,
    #[parameter(keyword = "temp", coerce = "float")]
    pub temperature: Option<ParameterValue>,
}

#[derive(Debug, Clone, PartialEq, Device)]
#[device(letter = 'M', pins("drain", "gate", "source", "bulk"))]
pub struct Mosfet {
    pub name: String,
    pub nodes: Vec<String>,
    #[parameter(position = 0, key_parameter, coerce = "model")]
    pub model: Option<ParameterValue>,
    #[parameter(keyword = "m", coerce = "int", default = "1")]
    pub multiplier: Option<ParameterValue>,
    #[parameter(keyword = "l", coerce = "float")]
    pub length: Option<ParameterValue>,
    #[parameter(keyword = "w", coerce = "float")]
    pub width: Option<ParameterValue>,
    #[parameter(keyword = "ad", coerce = "float")]
    pub drain_area: Option<ParameterValue>,
    #[parameter(keyword = "as", coerce = "float")]
    pub source_area: Option<ParameterValue>,
    #[parameter(keyword = "pd", coerce = "float")]
    pub drain_perimeter: Option<ParameterValue>,
    #[parameter(keyword = "ps", coerce = "float")]
    pub source_perimeter: Option<ParameterValue>,
    #[parameter(keyword = "nrd", coerce = "float")]
    pub drain_number_square: Option<ParameterValue>,
    #[parameter(keyword = "nrs", coerce = "float")]
    pub source_number_square: Option<ParameterValue>,
    #[parameter(flag = "off")]
    pub off: bool,
    #[parameter(keyword, coerce = "float_triplet")]
    pub ic: Option<ParameterValue>,
    #[parameter(keyword = "temp", coerce = "float")]
    pub temperature: Option<ParameterValue>,
}

#[derive(Debug, Clone, PartialEq, Device)]
#[device(
    letter = 'T',
    pins("input_plus", "input_minus", "output_plus", "output_minus")
)]
pub struct LosslessTransmissionLine {
    pub name: String,
    pub nodes: Vec<String>,
    #[parameter(keyword = "z0", coerce = "float")]
    pub impedance: Option<ParameterValue>,
    #[parameter(keyword = "td", coerce = "float")]
    pub time_delay: Option<ParameterValue>,
    #[parameter(keyword = "f", coerce = "float")]
    pub frequency: Option<ParameterValue>,
    #[parameter(keyword = "nl", coerce = "float")]
    pub normalized_length: Option<ParameterValue>,
}

#[derive(Debug, Clone, PartialEq, Device)]
#[device(
    letter = 'O',
    pins("input_plus", "input_minus", "output_plus", "output_minus")
)]
pub struct LossyTransmission {
    pub name: String,
    pub nodes: Vec<String>,
    #[parameter(position = 0, key_parameter, coerce = "model")]
    pub model: Option<ParameterValue>,
}

#[derive(Debug, Clone, PartialEq, Device)]
#[device(letter = 'U', pins("output", "input", "capacitance_node"))]
pub struct UniformDistributedRCLine {
    pub name: String,
    pub nodes: Vec<String>,
    #[parameter(position = 0, key_parameter, coerce = "model")]
    pub model: Option<ParameterValue>,
    #[parameter(keyword = "l", coerce = "float")]
    pub length: Option<ParameterValue>,
    #[parameter(keyword = "n", coerce = "int")]
    pub number_of_lumps: Option<ParameterValue>,
}

#[derive(Debug, Clone, PartialEq, Device)]
#[device(
    letter = 'Y',
    pins("input_plus", "input_minus", "output_plus", "output_minus")
)]
pub struct SingleLossyTransmissionLine {
    pub name: String,
    pub nodes: Vec<String>,
    #[parameter(position = 0, key_parameter, coerce = "model")]
    pub model: Option<ParameterValue>,
    #[parameter(keyword = "len", coerce = "float")]
    pub length: Option<ParameterValue>,
}

/// The built-in classes, in lookup order.
pub fn classes() -> Vec<&'static DeviceClass> {
    vec![
        SubCircuitElement::class(),
        Resistor::class(),
        SemiconductorResistor::class(),
        BehavioralResistor::class(),
        Capacitor::class(),
        SemiconductorCapacitor::class(),
        BehavioralCapacitor::class(),
        Inductor::class(),
        BehavioralInductor::class(),
        CoupledInductor::class(),
        VoltageControlledSwitch::class(),
        CurrentControlledSwitch::class(),
        VoltageSource::class(),
        CurrentSource::class(),
        VoltageControlledVoltageSource::class(),
        NonLinearVoltageSource::class(),
        CurrentControlledCurrentSource::class(),
        VoltageControlledCurrentSource::class(),
        CurrentControlledVoltageSource::class(),
        BehavioralSource::class(),
        Diode::class(),
        BipolarJunctionTransistor::class(),
        JunctionFieldEffectTransistor::class(),
        Mesfet::class(),
        Mosfet::class(),
        LosslessTransmissionLine::class(),
        LossyTransmission::class(),
        UniformDistributedRCLine::class(),
        SingleLossyTransmissionLine::class(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_tables() {
        let class = Resistor::class();
        assert_eq!(class.name, "Resistor");
        assert_eq!(class.letter, 'R');
        assert_eq!(class.pins.len(), 2);
        assert_eq!(class.positional_min(), 1);
        assert!(class.keyword("M").is_some());
        assert!(class.keyword("resistance").is_none());

        let class = BipolarJunctionTransistor::class();
        assert_eq!(class.required_pins(), 3);
        assert_eq!(class.max_pins(), 5);
        assert_eq!(class.positional_min(), 0);
        assert_eq!(class.positional_max(), 2);
        assert!(class.flag("off").is_some());
        assert!(class.keyword("model").is_some());

        let class = SubCircuitElement::class();
        assert!(class.variadic_pins && class.open_keywords);
        assert_eq!(class.max_pins(), usize::MAX);

        assert_eq!(Mosfet::class().keyword("as").map(|p| p.attribute), Some("source_area"));
        assert!(VoltageSource::class().merge_trailing);
    }

    #[test]
    fn test_unique_names() {
        let classes = classes();
        for (i, class) in classes.iter().enumerate() {
            assert!(classes[i + 1..].iter().all(|other| other.name != class.name));
        }
    }
}
