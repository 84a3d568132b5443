//! Equipment-type catalogue and inventory-code naming rules.

use serde::Serialize;

/// One equipment family and its code prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EquipmentType {
    pub prefix: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// Number of printed code stickers available for the family.
    pub sticker_count: u32,
    pub requires_serial: bool,
    pub requires_calibration: bool,
}

pub const EQUIPMENT_TYPES: &[EquipmentType] = &[
    EquipmentType {
        prefix: "EM-AGE",
        name: "Medical equipment",
        description: "Diagnostic and treatment equipment",
        sticker_count: 500,
        requires_serial: true,
        requires_calibration: true,
    },
    EquipmentType {
        prefix: "EO-AGE",
        name: "Office equipment",
        description: "Computers and office devices",
        sticker_count: 500,
        requires_serial: true,
        requires_calibration: false,
    },
    EquipmentType {
        prefix: "A-AGE",
        name: "Accessories",
        description: "Accessories and add-ons",
        sticker_count: 500,
        requires_serial: false,
        requires_calibration: false,
    },
    EquipmentType {
        prefix: "EQUI-AGE",
        name: "Emergency equipment",
        description: "Equipment for emergency situations",
        sticker_count: 200,
        requires_serial: true,
        requires_calibration: true,
    },
    EquipmentType {
        prefix: "CAF-AGE",
        name: "Cafeteria",
        description: "Cafeteria appliances and utensils",
        sticker_count: 100,
        requires_serial: false,
        requires_calibration: false,
    },
    EquipmentType {
        prefix: "HERR-AGE",
        name: "Tools",
        description: "Maintenance and repair tools",
        sticker_count: 200,
        requires_serial: false,
        requires_calibration: false,
    },
    EquipmentType {
        prefix: "ARCH-AGE",
        name: "Archive",
        description: "Filing equipment and furniture",
        sticker_count: 100,
        requires_serial: false,
        requires_calibration: false,
    },
];

/// Equipment type of a normalized inventory code, if its prefix is known.
pub fn equipment_type_for(code: &str) -> Option<&'static EquipmentType> {
    let mut parts = code.splitn(3, '-');
    let family = parts.next()?;
    let age = parts.next()?;
    let prefix = format!("{family}-{age}");
    EQUIPMENT_TYPES.iter().find(|t| t.prefix == prefix)
}

/// Naming guide served to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NomenclatureRules {
    pub equipment_types: &'static [EquipmentType],
    pub format: &'static str,
    pub examples: &'static [&'static str],
    pub notes: &'static [&'static str],
}

pub fn rules() -> NomenclatureRules {
    NomenclatureRules {
        equipment_types: EQUIPMENT_TYPES,
        format: "{TYPE}-{SEQ}-{MM}{YY}",
        examples: &[
            "EM-AGE-001-0821 (medical equipment #1, August 2021)",
            "EO-AGE-025-1223 (office equipment #25, December 2023)",
            "A-AGE-150-0324 (accessory #150, March 2024)",
        ],
        notes: &[
            "Always use uppercase",
            "Sequence number has 3 digits (001, 002, ...)",
            "Month has 2 digits (01-12)",
            "Year has 2 digits (21, 22, 23, ...)",
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medinv_core::validation::validate_inventory_code;

    #[test]
    fn known_prefixes_resolve() {
        assert_eq!(equipment_type_for("EM-AGE-001-0824").map(|t| t.name), Some("Medical equipment"));
        assert_eq!(equipment_type_for("HERR-AGE-010-0124").map(|t| t.sticker_count), Some(200));
        assert!(equipment_type_for("ZZ-AGE-001-0824").is_none());
        assert!(equipment_type_for("EM").is_none());
    }

    #[test]
    fn examples_follow_the_code_pattern() {
        for example in rules().examples {
            let code = example.split_whitespace().next().unwrap();
            assert!(validate_inventory_code(code).is_ok(), "{code}");
        }
    }
}
