use serde::{Deserialize, Serialize};

/// Account type chosen at registration.
/// Discriminants are the numeric codes the backend expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    #[default]
    Student = 1,
    Parent = 2,
    ContentCreator = 3,
    Specialist = 4,
    Admin = 5,
}

impl Role {
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Parse a role name as the backend reports it. Case-insensitive,
    /// accepts the content creator spellings in use, and falls back to
    /// `Student` for anything unrecognized.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "admin" => Role::Admin,
            "contentcreator" | "content-creator" | "content creator" | "content_creator" => {
                Role::ContentCreator
            }
            "specialist" => Role::Specialist,
            "parent" => Role::Parent,
            _ => Role::Student,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Parent => "Parent",
            Role::ContentCreator => "Content Creator",
            Role::Specialist => "Specialist",
            Role::Admin => "Admin",
        }
    }

    /// Whether registration carries expertise and CV fields
    pub fn is_professional(self) -> bool {
        matches!(self, Role::ContentCreator | Role::Specialist)
    }
}

impl Serialize for Role {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

/// Current user as returned by `GET /auth/me`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: String,
    pub full_name: String,
    pub role: String,
    #[serde(default)]
    pub profile_picture_url: Option<String>,
    #[serde(default)]
    pub is_first_login: bool,
    pub email: String,
}

impl UserDto {
    pub fn role(&self) -> Role {
        Role::parse(&self.role)
    }

    /// Initials for avatar placeholders: first and last name initials,
    /// or the first letter for single names
    pub fn initials(&self) -> String {
        let parts: Vec<&str> = self.full_name.split_whitespace().collect();
        let initials: String = match parts.as_slice() {
            [] => String::new(),
            [only] => only.chars().take(1).collect(),
            [first, .., last] => first.chars().take(1).chain(last.chars().take(1)).collect(),
        };
        initials.to_uppercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("Admin"), Role::Admin);
        assert_eq!(Role::parse(" ContentCreator "), Role::ContentCreator);
        assert_eq!(Role::parse("content-creator"), Role::ContentCreator);
        assert_eq!(Role::parse("Content Creator"), Role::ContentCreator);
        assert_eq!(Role::parse("SPECIALIST"), Role::Specialist);
        assert_eq!(Role::parse("parent"), Role::Parent);
        assert_eq!(Role::parse("student"), Role::Student);
        assert_eq!(Role::parse("unknown"), Role::Student);
    }

    #[test]
    fn test_role_codes() {
        assert_eq!(Role::Student.code(), 1);
        assert_eq!(Role::Admin.code(), 5);
        assert_eq!(serde_json::to_string(&Role::Specialist).unwrap(), "4");
        assert!(Role::ContentCreator.is_professional());
        assert!(!Role::Parent.is_professional());
    }

    #[test]
    fn test_parse_user() {
        let json = r#"{"id":"u1","fullName":"Layla Haddad","role":"ContentCreator","isFirstLogin":true,"email":"layla@example.com"}"#;
        let user: UserDto = serde_json::from_str(json).unwrap();
        assert_eq!(user.role(), Role::ContentCreator);
        assert_eq!(user.role().display_name(), "Content Creator");
        assert!(user.is_first_login);
        assert_eq!(user.profile_picture_url, None);
        assert_eq!(user.initials(), "LH");
    }

    #[test]
    fn test_initials() {
        let mut user = UserDto {
            id: "u2".to_string(),
            full_name: "omar".to_string(),
            role: "Student".to_string(),
            profile_picture_url: None,
            is_first_login: false,
            email: "omar@example.com".to_string(),
        };
        assert_eq!(user.initials(), "O");

        user.full_name = "Sara Bint Ali".to_string();
        assert_eq!(user.initials(), "SA");

        user.full_name = "  ".to_string();
        assert_eq!(user.initials(), "");
    }
}
