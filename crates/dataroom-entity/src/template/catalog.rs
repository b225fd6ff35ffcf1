//! Built-in dataroom templates.

use serde::Serialize;

use super::model::TemplateFolder;

/// A named, ready-made folder structure.
#[derive(Debug, Clone, Serialize)]
pub struct DataroomTemplate {
    /// Stable lookup key.
    pub key: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Root-level folders.
    pub folders: Vec<TemplateFolder>,
}

fn folder(name: &str, children: &[&str]) -> TemplateFolder {
    TemplateFolder::with_children(
        name,
        children.iter().map(|c| TemplateFolder::leaf(*c)).collect(),
    )
}

/// All built-in templates.
pub fn builtin_templates() -> Vec<DataroomTemplate> {
    vec![
        DataroomTemplate {
            key: "fundraising",
            name: "Fundraising",
            folders: vec![
                folder("Company Overview", &["Pitch Deck", "Executive Summary"]),
                folder("Financials", &["Historical Financials", "Projections", "Cap Table"]),
                folder("Legal", &["Incorporation Documents", "Shareholder Agreements"]),
                folder("Product", &["Roadmap", "Technical Documentation"]),
                folder("Team", &[]),
            ],
        },
        DataroomTemplate {
            key: "mergers-acquisitions",
            name: "Mergers & Acquisitions",
            folders: vec![
                folder("Corporate", &["Organizational Chart", "Board Minutes"]),
                folder("Financial", &["Audited Statements", "Tax Returns", "Debt"]),
                folder("Legal", &["Material Contracts", "Litigation", "Intellectual Property"]),
                folder("Human Resources", &["Employment Agreements", "Benefit Plans"]),
                folder("Commercial", &["Customers", "Suppliers"]),
            ],
        },
        DataroomTemplate {
            key: "real-estate",
            name: "Real Estate",
            folders: vec![
                folder("Property Information", &["Title", "Surveys", "Zoning"]),
                folder("Leases", &["Rent Roll", "Tenant Agreements"]),
                folder("Financials", &["Operating Statements", "Budgets"]),
                folder("Due Diligence", &["Environmental", "Inspections"]),
            ],
        },
    ]
}

/// Look up a built-in template by key.
pub fn builtin_template(key: &str) -> Option<DataroomTemplate> {
    builtin_templates().into_iter().find(|t| t.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_lookup_by_key() {
        let template = builtin_template("real-estate").expect("template exists");
        assert_eq!(template.name, "Real Estate");
        assert!(builtin_template("unknown").is_none());
    }

    #[test]
    fn test_builtin_templates_are_valid() {
        for template in builtin_templates() {
            for folder in &template.folders {
                assert!(folder.validate().is_ok(), "{} is invalid", template.key);
            }
        }
    }
}
