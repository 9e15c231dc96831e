pub const HONOREE: &str = "ASONIA";

pub const COVER_MEDIA: &str = "video1";
pub const WISHES_MEDIA: &str = "video7";

pub struct Letter {
    pub letter: char,
    pub meaning: &'static str,
    pub compliment: &'static str,
}

pub static LETTERS: [Letter; 6] = [
    Letter { letter: 'A', meaning: "Alluring", compliment: "Your presence lights up every room" },
    Letter { letter: 'S', meaning: "Stunning", compliment: "Natural elegance that captivates" },
    Letter { letter: 'O', meaning: "Original", compliment: "Unique in every way" },
    Letter { letter: 'N', meaning: "Natural", compliment: "Effortlessly sophisticated" },
    Letter { letter: 'I', meaning: "Inspiring", compliment: "Your strength shines through" },
    Letter { letter: 'A', meaning: "Amazing", compliment: "A heart as beautiful as your smile" },
];

pub struct Moment {
    pub media: &'static str,
    pub title: &'static str,
    pub poem: [&'static str; 4],
}

pub static MOMENTS: [Moment; 5] = [
    Moment {
        media: "video2",
        title: "Moment 1",
        poem: [
            "Grace flows through every step you take,",
            "A beauty time cannot forsake,",
            "In every moment, pure and true,",
            "The world shines brighter just for you.",
        ],
    },
    Moment {
        media: "video3",
        title: "Moment 2",
        poem: [
            "Like stars that paint the midnight sky,",
            "Your elegance will never die,",
            "A spirit rare, a heart so gold,",
            "Your story forever to be told.",
        ],
    },
    Moment {
        media: "video4",
        title: "Moment 3",
        poem: [
            "In laughter's light and gentle smile,",
            "You make each moment so worthwhile,",
            "A queen of grace, a soul so bright,",
            "You turn the darkest day to light.",
        ],
    },
    Moment {
        media: "video5",
        title: "Moment 4",
        poem: [
            "Through every season, rain or shine,",
            "Your inner beauty will define,",
            "The way you walk, the way you glow,",
            "A masterpiece from head to toe.",
        ],
    },
    Moment {
        media: "video6",
        title: "Moment 5",
        poem: [
            "On this day, we celebrate you,",
            "Every dream and wish come true,",
            "May joy and love forever stay,",
            "Happy Birthday, beautiful today.",
        ],
    },
];

pub static COMPLIMENTS: [&str; 4] = [
    "Kind without keeping score",
    "Brave on the days that ask for it",
    "The laugh everyone waits for",
    "A friend who remembers the small things",
];

pub const FINAL_WISH: &str =
    "Here's to another year of you: bright, bold, and endlessly loved. Happy Birthday!";
