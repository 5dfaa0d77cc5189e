// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Field-level validation of recipe requests.
//!
//! Every rule runs; failures are collected rather than short-circuited so a
//! client sees all problems at once. Field paths use the camelCase wire names.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const MAX_NAME_CHARS: usize = 200;
pub const MAX_UNIT_CHARS: usize = 32;
pub const MAX_INSTRUCTION_CHARS: usize = 2000;
pub const MAX_ALT_CHARS: usize = 200;

/// One failed rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    /// camelCase path, e.g. `ingredients[1].name`.
    pub field: String,
    pub message: String,
}

/// Every failed rule for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{} validation error(s)", .0.len())]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    pub fn into_inner(self) -> Vec<FieldError> {
        self.0
    }

    /// `Ok(())` when nothing failed.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

// =============================================================================
// Request Types
// =============================================================================

/// Ingredient as sent by the client.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngredientRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstructionRequest {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
}

/// Recipe body for create and update.
///
/// Fields are optional and list items nullable so that missing or null values
/// surface as field errors instead of deserialization failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecipeRequest {
    #[serde(default)]
    pub name: Option<String>,
    /// Minutes.
    #[serde(default)]
    pub cook_time: Option<i64>,
    /// Minutes.
    #[serde(default)]
    pub prep_time: Option<i64>,
    #[serde(default)]
    pub ingredients: Vec<Option<IngredientRequest>>,
    #[serde(default)]
    pub instructions: Vec<Option<InstructionRequest>>,
    #[serde(default)]
    pub image: Option<ImageRequest>,
}

// =============================================================================
// Rules
// =============================================================================

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

fn too_long(value: Option<&str>, max: usize) -> bool {
    value.is_some_and(|v| v.chars().count() > max)
}

/// Recipe ids must be non-empty UUIDs.
pub fn validate_id(id: &str, errors: &mut ValidationErrors) {
    if id.trim().is_empty() {
        errors.push("id", "must not be empty");
    } else if uuid::Uuid::parse_str(id).is_err() {
        errors.push("id", "must be a valid UUID");
    }
}

fn validate_minutes(field: &str, value: Option<i64>, errors: &mut ValidationErrors) {
    match value {
        None => errors.push(field, "must not be empty"),
        Some(v) if v <= 0 => errors.push(field, "must be greater than 0"),
        Some(v) if v > i64::from(u32::MAX) => {
            errors.push(field, format!("must be at most {}", u32::MAX))
        }
        Some(_) => {}
    }
}

fn validate_ingredient(index: usize, item: Option<&IngredientRequest>, errors: &mut ValidationErrors) {
    let prefix = format!("ingredients[{index}]");
    let Some(ingredient) = item else {
        errors.push(prefix, "must not be null");
        return;
    };

    if is_blank(ingredient.name.as_deref()) {
        errors.push(format!("{prefix}.name"), "must not be empty");
    }
    if let Some(quantity) = ingredient.quantity {
        if !(quantity.is_finite() && quantity > 0.0) {
            errors.push(format!("{prefix}.quantity"), "must be greater than 0");
        }
    }
    if too_long(ingredient.unit.as_deref(), MAX_UNIT_CHARS) {
        errors.push(
            format!("{prefix}.unit"),
            format!("must be {MAX_UNIT_CHARS} characters or fewer"),
        );
    }
}

fn validate_instruction(
    index: usize,
    item: Option<&InstructionRequest>,
    errors: &mut ValidationErrors,
) {
    let prefix = format!("instructions[{index}]");
    let Some(instruction) = item else {
        errors.push(prefix, "must not be null");
        return;
    };

    if is_blank(instruction.text.as_deref()) {
        errors.push(format!("{prefix}.text"), "must not be empty");
    } else if too_long(instruction.text.as_deref(), MAX_INSTRUCTION_CHARS) {
        errors.push(
            format!("{prefix}.text"),
            format!("must be {MAX_INSTRUCTION_CHARS} characters or fewer"),
        );
    }
}

fn validate_image(image: &ImageRequest, errors: &mut ValidationErrors) {
    match image.url.as_deref().map(str::trim) {
        None | Some("") => errors.push("image.url", "must not be empty"),
        Some(raw) => {
            let absolute_http = url::Url::parse(raw)
                .map(|u| matches!(u.scheme(), "http" | "https"))
                .unwrap_or(false);
            if !absolute_http {
                errors.push("image.url", "must be an absolute http or https URL");
            }
        }
    }
    if too_long(image.alt.as_deref(), MAX_ALT_CHARS) {
        errors.push(
            "image.alt",
            format!("must be {MAX_ALT_CHARS} characters or fewer"),
        );
    }
}

impl RecipeRequest {
    /// Apply every body rule, appending failures to `errors`.
    pub fn validate_into(&self, errors: &mut ValidationErrors) {
        if is_blank(self.name.as_deref()) {
            errors.push("name", "must not be empty");
        } else if too_long(self.name.as_deref().map(str::trim), MAX_NAME_CHARS) {
            errors.push("name", format!("must be {MAX_NAME_CHARS} characters or fewer"));
        }

        validate_minutes("cookTime", self.cook_time, errors);
        validate_minutes("prepTime", self.prep_time, errors);

        if self.ingredients.is_empty() {
            errors.push("ingredients", "must contain at least one ingredient");
        }
        for (i, item) in self.ingredients.iter().enumerate() {
            validate_ingredient(i, item.as_ref(), errors);
        }

        if self.instructions.is_empty() {
            errors.push("instructions", "must contain at least one instruction");
        }
        for (i, item) in self.instructions.iter().enumerate() {
            validate_instruction(i, item.as_ref(), errors);
        }

        if let Some(image) = &self.image {
            validate_image(image, errors);
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        self.validate_into(&mut errors);
        errors.into_result()
    }
}
