use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FaqEntry {
    pub question: &'static str,
    pub answer: &'static str,
}

pub const FAQ: &[FaqEntry] = &[
    FaqEntry {
        question: "What is the item name of Supplier X?",
        answer: "To get the item name of a supplier, please provide the supplier's code.",
    },
    FaqEntry {
        question: "List the items ordered by Department X",
        answer: "You can find the list of items by entering the department's name in the query.",
    },
    FaqEntry {
        question: "How to check total spend by each supplier?",
        answer: "You can check the total spend by a supplier by asking for total spend by the supplier code.",
    },
    FaqEntry {
        question: "What is the procurement cost within a specific time frame?",
        answer: "Specify the start and end dates to get the procurement cost within that range.",
    },
];
