//! Form controls and the control registry
//!
//! A control binds a field to an input strategy. Control kinds are a closed
//! enum plus `custom:<name>`; the registry maps each kind to a constructor
//! and refuses duplicate registrations, so an unsupported kind is reported
//! when a schema is loaded or a form is built, not when input arrives.

use crate::domain::field::{parse_bool, set_path, Field, FieldBound, FieldType, Schema};
use crate::error::{CrudError, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ControlKind {
    Input,
    Date,
    Check,
    Textarea,
    Combo,
    SiNoCombo,
    CollectionCombo,
    Select2Combo,
    Select2MultiCombo,
    Custom(String),
}

impl ControlKind {
    /// Kind used when a field does not name one.
    pub fn default_for(field_type: FieldType, has_options: bool) -> Self {
        match field_type {
            FieldType::Date => ControlKind::Date,
            FieldType::Check => ControlKind::Check,
            _ if has_options => ControlKind::Combo,
            _ => ControlKind::Input,
        }
    }

    pub fn builtins() -> [ControlKind; 9] {
        [
            ControlKind::Input,
            ControlKind::Date,
            ControlKind::Check,
            ControlKind::Textarea,
            ControlKind::Combo,
            ControlKind::SiNoCombo,
            ControlKind::CollectionCombo,
            ControlKind::Select2Combo,
            ControlKind::Select2MultiCombo,
        ]
    }
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlKind::Input => write!(f, "input"),
            ControlKind::Date => write!(f, "date"),
            ControlKind::Check => write!(f, "check"),
            ControlKind::Textarea => write!(f, "textarea"),
            ControlKind::Combo => write!(f, "combo"),
            ControlKind::SiNoCombo => write!(f, "sinocombo"),
            ControlKind::CollectionCombo => write!(f, "collectioncombo"),
            ControlKind::Select2Combo => write!(f, "select2combo"),
            ControlKind::Select2MultiCombo => write!(f, "select2multicombo"),
            ControlKind::Custom(name) => write!(f, "custom:{}", name),
        }
    }
}

impl FromStr for ControlKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let tag = s.trim().to_lowercase();
        if let Some(name) = tag.strip_prefix("custom:") {
            if name.is_empty() {
                return Err("custom control needs a name (custom:<name>)".to_string());
            }
            return Ok(ControlKind::Custom(name.to_string()));
        }
        match tag.as_str() {
            "" | "input" => Ok(ControlKind::Input),
            "date" => Ok(ControlKind::Date),
            "check" => Ok(ControlKind::Check),
            "textarea" => Ok(ControlKind::Textarea),
            "combo" => Ok(ControlKind::Combo),
            "sinocombo" => Ok(ControlKind::SiNoCombo),
            "collectioncombo" => Ok(ControlKind::CollectionCombo),
            "select2combo" => Ok(ControlKind::Select2Combo),
            "select2multicombo" => Ok(ControlKind::Select2MultiCombo),
            _ => Err(format!("control of type \"{}\" not supported", s)),
        }
    }
}

/// Parses user text for a control.
pub type InputParser = fn(&Control, &str) -> Result<Value>;

/// Builds a control for a field.
pub type ControlConstructor = fn(&ControlKind, &Field) -> Result<Control>;

/// A field bound to an input strategy.
#[derive(Debug, Clone)]
pub struct Control {
    pub kind: ControlKind,
    pub field: Field,
    pub label: String,
    pub editable: bool,
    pub help: String,
    pub span: Option<u32>,
    parser: InputParser,
}

impl Control {
    pub fn new(kind: &ControlKind, field: &Field, parser: InputParser) -> Self {
        Control {
            kind: kind.clone(),
            label: field.label.clone(),
            editable: field.editable,
            help: String::new(),
            span: field.span,
            field: field.clone(),
            parser,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    /// Convert user text into the field value. Read-only controls refuse input.
    pub fn parse_input(&self, text: &str) -> Result<Value> {
        if !self.editable {
            return Err(CrudError::Control(format!(
                "field '{}' is not editable",
                self.field.name
            )));
        }
        (self.parser)(self, text)
    }
}

fn parse_with_field(control: &Control, text: &str) -> Result<Value> {
    control.field.parse_input(text)
}

fn parse_yes_no(control: &Control, text: &str) -> Result<Value> {
    parse_bool(text.trim()).map(Value::Bool).ok_or_else(|| {
        CrudError::InvalidInput(format!(
            "{} = '{}': expected yes/no",
            control.field.name, text
        ))
    })
}

fn parse_option(control: &Control, text: &str) -> Result<Value> {
    let wanted = text.trim();
    let option = control
        .field
        .options
        .iter()
        .find(|o| o.eq_ignore_ascii_case(wanted))
        .ok_or_else(|| {
            CrudError::InvalidInput(format!(
                "{} = '{}': expected one of {}",
                control.field.name,
                text,
                control.field.options.join(", ")
            ))
        })?;
    control.field.parse_input(option)
}

fn parse_multi(control: &Control, text: &str) -> Result<Value> {
    if control.field.field_type == FieldType::ArrayObject {
        return control.field.parse_input(text);
    }
    Ok(Value::Array(
        text.split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| Value::String(v.to_string()))
            .collect(),
    ))
}

fn text_control(kind: &ControlKind, field: &Field) -> Result<Control> {
    Ok(Control::new(kind, field, parse_with_field))
}

fn check_control(kind: &ControlKind, field: &Field) -> Result<Control> {
    Ok(Control::new(kind, field, parse_yes_no).with_help("yes/no"))
}

fn combo_control(kind: &ControlKind, field: &Field) -> Result<Control> {
    if field.options.is_empty() {
        return Err(CrudError::Control(format!(
            "combo control for '{}' needs options",
            field.name
        )));
    }
    let help = field.options.join("|");
    Ok(Control::new(kind, field, parse_option).with_help(help))
}

fn collection_combo_control(kind: &ControlKind, field: &Field) -> Result<Control> {
    Ok(Control::new(kind, field, parse_with_field).with_help("id"))
}

fn multi_control(kind: &ControlKind, field: &Field) -> Result<Control> {
    Ok(Control::new(kind, field, parse_multi).with_help("comma separated"))
}

/// Maps control kinds to constructors.
#[derive(Debug, Clone, Default)]
pub struct ControlRegistry {
    constructors: HashMap<ControlKind, ControlConstructor>,
}

impl ControlRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in kind.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for kind in ControlKind::builtins() {
            let constructor: ControlConstructor = match kind {
                ControlKind::Check | ControlKind::SiNoCombo => check_control,
                ControlKind::Combo => combo_control,
                ControlKind::CollectionCombo => collection_combo_control,
                ControlKind::Select2MultiCombo => multi_control,
                _ => text_control,
            };
            registry.constructors.insert(kind, constructor);
        }
        registry
    }

    /// Register a constructor. A kind can be registered once.
    pub fn register(&mut self, kind: ControlKind, constructor: ControlConstructor) -> Result<()> {
        if self.constructors.contains_key(&kind) {
            return Err(CrudError::Control(format!(
                "control of type \"{}\" already registered",
                kind
            )));
        }
        self.constructors.insert(kind, constructor);
        Ok(())
    }

    pub fn is_registered(&self, kind: &ControlKind) -> bool {
        self.constructors.contains_key(kind)
    }

    /// Build the control a field asks for.
    pub fn create(&self, field: &Field) -> Result<Control> {
        let constructor = self.constructors.get(&field.control).ok_or_else(|| {
            CrudError::Control(format!(
                "control of type \"{}\" not registered",
                field.control
            ))
        })?;
        constructor(&field.control, field)
    }
}

/// The controls of a form schema.
#[derive(Debug, Clone)]
pub struct Form {
    schema: Schema,
    controls: Vec<Control>,
}

impl Form {
    pub fn build(schema: &Schema, registry: &ControlRegistry) -> Result<Self> {
        let controls = schema
            .iter()
            .map(|field| registry.create(field))
            .collect::<Result<Vec<_>>>()?;
        Ok(Form {
            schema: schema.clone(),
            controls,
        })
    }

    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    pub fn control(&self, name: &str) -> Option<&Control> {
        self.controls.iter().find(|c| c.field.name == name)
    }

    /// Parse `name=value` assignments into `record`.
    pub fn apply(&self, record: &mut Value, assignments: &[(String, String)]) -> Result<()> {
        for (name, text) in assignments {
            let control = self.control(name).ok_or_else(|| {
                CrudError::InvalidInput(format!("unknown field '{}' in form", name))
            })?;
            let value = control.parse_input(text)?;
            set_path(record, name, value);
        }
        Ok(())
    }
}

impl FieldBound for Form {
    fn schema(&self) -> &Schema {
        &self.schema
    }
}
