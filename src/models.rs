//! Entity documents shared by the store and the GraphQL schema.

use async_graphql::{Enum, InputObject, SimpleObject, Union};

use crate::scalars::LessonDate;
use crate::store::Document;

/// Documents attributed to a creating user.
pub trait Authored: Document {
    fn creator(&self) -> &str;
}

/// A user's subscription summary, as mirrored from Stripe.
#[derive(SimpleObject, Debug, Clone, PartialEq)]
pub struct PaymentPackage {
    pub amount: i64,
    pub cadence: String,
    pub status: String,
    pub since: i64,
    pub trial_end: i64,
}

impl PaymentPackage {
    /// The package stored when no Stripe customer matches the user.
    pub fn inactive() -> Self {
        Self {
            amount: 0,
            cadence: "N/A".to_string(),
            status: "Inactive".to_string(),
            since: 0,
            trial_end: 0,
        }
    }
}

/// A platform user, keyed by Google profile id.
///
/// `bookmarks` holds lesson ids and is exposed through a complex resolver
/// that loads the lessons themselves.
#[derive(SimpleObject, Debug, Clone, PartialEq)]
#[graphql(complex)]
pub struct User {
    pub id: String,
    pub name: String,
    pub avatar: String,
    pub contact: String,
    #[graphql(skip)]
    pub token: String,
    pub payment_id: Option<String>,
    pub package: Option<PaymentPackage>,
    #[graphql(skip)]
    pub watched: Vec<String>,
    #[graphql(skip)]
    pub bookmarks: Vec<String>,
}

impl Document for User {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(SimpleObject, Debug, Clone, PartialEq)]
pub struct Lesson {
    pub id: String,
    pub title: String,
    /// Short description shown to students.
    pub meta: String,
    pub category: Vec<String>,
    pub start_date: LessonDate,
    pub end_date: LessonDate,
    pub video: String,
    pub duration: f64,
    pub creator: String,
}

impl Document for Lesson {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Authored for Lesson {
    fn creator(&self) -> &str {
        &self.creator
    }
}

#[derive(Enum, Debug, Copy, Clone, Eq, PartialEq)]
pub enum AnswerType {
    #[graphql(name = "MULTIPLECHOICE")]
    MultipleChoice,
    #[graphql(name = "TRUEFALSE")]
    TrueFalse,
}

#[derive(SimpleObject, InputObject, Debug, Clone, PartialEq)]
#[graphql(input_name = "AnswerOptionInput")]
pub struct AnswerOption {
    pub answer_text: String,
    pub is_correct: bool,
}

#[derive(SimpleObject, InputObject, Debug, Clone, PartialEq)]
#[graphql(input_name = "QuestionInput")]
pub struct Question {
    pub question: String,
    pub answer_type: AnswerType,
    pub answer_options: Vec<AnswerOption>,
}

#[derive(SimpleObject, Debug, Clone, PartialEq)]
pub struct Quiz {
    pub id: String,
    pub title: String,
    pub creator: String,
    pub questions: Vec<Question>,
}

impl Document for Quiz {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Authored for Quiz {
    fn creator(&self) -> &str {
        &self.creator
    }
}

#[derive(Enum, Debug, Copy, Clone, Eq, PartialEq)]
pub enum EmbedKind {
    Image,
    Link,
}

#[derive(SimpleObject, InputObject, Debug, Clone, PartialEq)]
#[graphql(input_name = "EmbedInput")]
pub struct Embed {
    pub kind: EmbedKind,
    pub source: String,
}

#[derive(SimpleObject, InputObject, Debug, Clone, PartialEq)]
#[graphql(input_name = "ArticleContentInput")]
pub struct ArticleContent {
    pub text: String,
    pub embed: Option<Embed>,
}

#[derive(SimpleObject, Debug, Clone, PartialEq)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub content: ArticleContent,
    pub creator: String,
}

impl Document for Article {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Authored for Article {
    fn creator(&self) -> &str {
        &self.creator
    }
}

/// An entry in a playlist's plan: a lesson or a quiz.
#[derive(Union, Debug, Clone, PartialEq)]
pub enum PlanItem {
    Lesson(Lesson),
    Quiz(Quiz),
}

impl PlanItem {
    /// Identifier of the underlying entity.
    pub fn id(&self) -> &str {
        match self {
            PlanItem::Lesson(lesson) => &lesson.id,
            PlanItem::Quiz(quiz) => &quiz.id,
        }
    }
}

#[derive(SimpleObject, Debug, Clone, PartialEq)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub creator: String,
    pub public: bool,
    pub plan: Vec<PlanItem>,
}

impl Document for Playlist {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Authored for Playlist {
    fn creator(&self) -> &str {
        &self.creator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inactive_package() {
        let package = PaymentPackage::inactive();
        assert_eq!(package.amount, 0);
        assert_eq!(package.cadence, "N/A");
        assert_eq!(package.status, "Inactive");
    }

    #[test]
    fn test_plan_item_id() {
        let quiz = Quiz {
            id: "q1".to_string(),
            title: "Fractions".to_string(),
            creator: "u1".to_string(),
            questions: vec![],
        };
        assert_eq!(PlanItem::Quiz(quiz).id(), "q1");
    }
}
