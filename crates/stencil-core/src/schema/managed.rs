//! Schema-editing operations used by interactive schema editors.

use crate::error::SchemaError;
use crate::schema::field::Field;
use crate::schema::fields::StringField;
use crate::schema::schema::Schema;

/// Direction of a reorder operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    /// Towards the front of the order.
    Left,
    /// Towards the back of the order.
    Right,
}

/// Editing operations over a schema's structure.
///
/// Reorders rebuild the field order only; the fields themselves are
/// untouched. Moves at a boundary position clamp instead of failing.
pub trait ManagedSchema {
    /// Start a new schemata group by inserting a placeholder field.
    fn add_schemata(&mut self, name: &str) -> Result<(), SchemaError>;

    /// Remove every field belonging to the named schemata group.
    fn del_schemata(&mut self, name: &str) -> Result<(), SchemaError>;

    /// Move a field one position within its schemata group.
    fn move_field(&mut self, name: &str, direction: MoveDirection) -> Result<(), SchemaError>;

    /// Move a whole schemata group one position among the groups.
    fn move_schemata(&mut self, name: &str, direction: MoveDirection) -> Result<(), SchemaError>;
}

fn shifted(pos: usize, len: usize, direction: MoveDirection) -> usize {
    match direction {
        MoveDirection::Left => pos.saturating_sub(1),
        MoveDirection::Right => (pos + 1).min(len.saturating_sub(1)),
    }
}

impl ManagedSchema for Schema {
    fn add_schemata(&mut self, name: &str) -> Result<(), SchemaError> {
        if self.schemata_names().iter().any(|n| n == name) {
            return Err(SchemaError::SchemataExists {
                name: name.to_string(),
            });
        }
        self.add_field(Box::new(
            StringField::new(format!("{name}_default")).in_schemata(name),
        ))
    }

    fn del_schemata(&mut self, name: &str) -> Result<(), SchemaError> {
        let doomed: Vec<String> = self
            .schemata_fields(name)
            .iter()
            .map(|f| f.name().to_string())
            .collect();
        for field_name in doomed {
            self.del_field(&field_name)?;
        }
        Ok(())
    }

    fn move_field(&mut self, name: &str, direction: MoveDirection) -> Result<(), SchemaError> {
        let group = self
            .field(name)
            .map(|f| f.schemata().to_string())
            .ok_or_else(|| SchemaError::UnknownField {
                field: name.to_string(),
            })?;

        let mut groups: Vec<Vec<String>> = self
            .schemata_names()
            .iter()
            .map(|s| {
                self.schemata_fields(s)
                    .iter()
                    .map(|f| f.name().to_string())
                    .collect()
            })
            .collect();

        let group_names = self.schemata_names();
        for (group_name, list) in group_names.iter().zip(groups.iter_mut()) {
            if group_name != &group {
                continue;
            }
            if let Some(pos) = list.iter().position(|n| n == name) {
                let target = shifted(pos, list.len(), direction);
                let item = list.remove(pos);
                list.insert(target, item);
            }
        }

        self.set_order(groups.into_iter().flatten().collect());
        Ok(())
    }

    fn move_schemata(&mut self, name: &str, direction: MoveDirection) -> Result<(), SchemaError> {
        let mut names = self.schemata_names();
        let pos = names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| SchemaError::UnknownSchemata {
                name: name.to_string(),
            })?;

        let target = shifted(pos, names.len(), direction);
        let item = names.remove(pos);
        names.insert(target, item);

        let order: Vec<String> = names
            .iter()
            .flat_map(|s| {
                self.schemata_fields(s)
                    .iter()
                    .map(|f| f.name().to_string())
                    .collect::<Vec<_>>()
            })
            .collect();
        self.set_order(order);
        Ok(())
    }
}
