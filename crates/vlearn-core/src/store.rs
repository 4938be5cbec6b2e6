//! A handle bundling one repository per entity over a shared
//! `FirestoreClient`, so generators and the orchestrator take a single
//! `&Store` instead of threading six repositories through every signature.

use vlearn_store::{
    AttemptRepository, CreditHistoryRepository, FirestoreClient, NotesRepository, ProjectRepository,
    ProjectVideoLinkRepository, QuestionRepository, QuizRepository, ReportRepository, UserRepository, VideoRepository,
};

pub struct Store {
    pub videos: VideoRepository,
    pub questions: QuestionRepository,
    pub quizzes: QuizRepository,
    pub attempts: AttemptRepository,
    pub notes: NotesRepository,
    pub reports: ReportRepository,
    pub users: UserRepository,
    pub credit_history: CreditHistoryRepository,
    pub projects: ProjectRepository,
    pub project_links: ProjectVideoLinkRepository,
}

impl Store {
    pub fn new(client: FirestoreClient) -> Self {
        Self {
            videos: VideoRepository::new(client.clone()),
            questions: QuestionRepository::new(client.clone()),
            quizzes: QuizRepository::new(client.clone()),
            attempts: AttemptRepository::new(client.clone()),
            notes: NotesRepository::new(client.clone()),
            reports: ReportRepository::new(client.clone()),
            users: UserRepository::new(client.clone()),
            credit_history: CreditHistoryRepository::new(client.clone()),
            projects: ProjectRepository::new(client.clone()),
            project_links: ProjectVideoLinkRepository::new(client),
        }
    }
}
