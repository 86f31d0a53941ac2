//! Structural stage: entity declarations from port lists.
//!
//! Pure template expansion. The same template always renders to the same
//! bytes.

use serde::{Deserialize, Serialize};

use crate::part::Part;
use crate::port::Direction;
use crate::value::ValueType;

/// One port line of an entity declaration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortDecl {
    pub name: String,
    /// `in` or `out`
    pub direction: Direction,
    /// Target-language type name, e.g. `STD_LOGIC`
    #[serde(rename = "type")]
    pub ty: String,
}

/// Input of the structural stage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralTemplate {
    pub entity_name: String,
    pub ports: Vec<PortDecl>,
}

/// VHDL type for a declared port type. Untyped ports become `STD_LOGIC`.
pub fn vhdl_type(ty: Option<ValueType>) -> &'static str {
    match ty {
        Some(ValueType::Logic) | None => "STD_LOGIC",
        Some(ValueType::Bool) => "BOOLEAN",
        Some(ValueType::Int) => "INTEGER",
        Some(ValueType::Real) => "REAL",
    }
}

impl StructuralTemplate {
    /// Builds the template for `part`: inputs first, then outputs, each in
    /// declaration order.
    pub fn from_part(part: &Part, entity_name: impl Into<String>) -> Self {
        let ports = part
            .ports_by_direction()
            .map(|p| PortDecl {
                name: p.name.clone(),
                direction: p.direction,
                ty: vhdl_type(p.ty).to_string(),
            })
            .collect();
        Self {
            entity_name: entity_name.into(),
            ports,
        }
    }

    /// Renders the VHDL library clause and entity declaration.
    pub fn render_vhdl(&self) -> String {
        let mut vhdl = String::new();
        vhdl.push_str("library IEEE;\n");
        vhdl.push_str("use IEEE.STD_LOGIC_1164.ALL;\n\n");
        vhdl.push_str(&format!("entity {} is\n", self.entity_name));

        if !self.ports.is_empty() {
            let width = self.ports.iter().map(|p| p.name.len()).max().unwrap_or(0);
            let lines: Vec<String> = self
                .ports
                .iter()
                .map(|p| format!("        {:<width$} : {:<3} {}", p.name, p.direction.to_string(), p.ty))
                .collect();
            vhdl.push_str("    Port (\n");
            vhdl.push_str(&lines.join(";\n"));
            vhdl.push_str("\n    );\n");
        }

        vhdl.push_str(&format!("end {};\n", self.entity_name));
        vhdl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> StructuralTemplate {
        StructuralTemplate {
            entity_name: "register".to_string(),
            ports: vec![
                PortDecl {
                    name: "clk".to_string(),
                    direction: Direction::In,
                    ty: "STD_LOGIC".to_string(),
                },
                PortDecl {
                    name: "out_0".to_string(),
                    direction: Direction::Out,
                    ty: "STD_LOGIC".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_render_entity() {
        let text = template().render_vhdl();
        let expected = "library IEEE;\n\
                        use IEEE.STD_LOGIC_1164.ALL;\n\
                        \n\
                        entity register is\n    \
                        Port (\n        \
                        clk   : in  STD_LOGIC;\n        \
                        out_0 : out STD_LOGIC\n    \
                        );\n\
                        end register;\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_empty_port_list() {
        let text = StructuralTemplate {
            entity_name: "empty".to_string(),
            ports: Vec::new(),
        }
        .render_vhdl();
        assert!(!text.contains("Port"));
        assert!(text.ends_with("entity empty is\nend empty;\n"));
    }

    #[test]
    fn test_template_json_shape() {
        let json = serde_json::to_value(template()).unwrap();
        assert_eq!(json["entity_name"], "register");
        assert_eq!(json["ports"][1]["direction"], "out");
        assert_eq!(json["ports"][1]["type"], "STD_LOGIC");
    }

    #[test]
    fn test_vhdl_types() {
        assert_eq!(vhdl_type(None), "STD_LOGIC");
        assert_eq!(vhdl_type(Some(ValueType::Int)), "INTEGER");
        assert_eq!(vhdl_type(Some(ValueType::Real)), "REAL");
        assert_eq!(vhdl_type(Some(ValueType::Bool)), "BOOLEAN");
    }
}
