//! Java-specific name tables

/// Declaration node kinds that produce a chunk
pub const TYPE_DECLARATION_KINDS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
    "annotation_type_declaration",
];

/// Packages whose types are never reported as external dependencies
pub const BUILTIN_PACKAGES: &[&str] = &[
    // Core
    "java.",
    "javax.",
    "jakarta.",
    "sun.",
    "jdk.",
    // Spring
    "org.springframework",
    // Common libraries
    "org.slf4j",
    "org.apache.commons",
    "org.apache.logging",
    "com.fasterxml.jackson",
    "com.google.gson",
    "org.junit",
    "org.mockito",
    "org.hibernate",
    "com.mysql",
    "org.postgresql",
    "redis.clients",
    "com.mongodb",
    "org.apache.kafka",
    "org.apache.http",
    "okhttp3",
    "retrofit2",
    "lombok",
];

/// Primitives, wrappers and ubiquitous platform types
pub const BUILTIN_TYPES: &[&str] = &[
    // Primitives
    "byte", "short", "int", "long", "float", "double", "char", "boolean", "void", "var",
    // Wrappers
    "Boolean", "Byte", "Short", "Integer", "Long", "Float", "Double", "Character", "Void",
    // java.lang
    "Object", "Class", "Enum", "Record", "String", "StringBuilder", "StringBuffer", "Math",
    "System", "Thread", "Runnable", "Exception", "RuntimeException", "Error", "Throwable",
    "Comparable", "Iterable", "CharSequence", "Number", "Override", "Deprecated",
    "FunctionalInterface", "SuppressWarnings", "IllegalArgumentException",
    "IllegalStateException", "NullPointerException", "UnsupportedOperationException",
    // java.util
    "Collection", "List", "Set", "Map", "Queue", "Deque", "ArrayList", "LinkedList", "HashSet",
    "LinkedHashSet", "TreeSet", "HashMap", "LinkedHashMap", "TreeMap", "Hashtable", "Vector",
    "Collections", "Arrays", "Objects", "Optional", "Stream", "Iterator",
    // java.util.concurrent / function
    "CompletableFuture", "Future", "Function", "Supplier", "Consumer", "Predicate", "BiFunction",
    // java.time
    "LocalDate", "LocalTime", "LocalDateTime", "ZonedDateTime", "Instant", "Duration", "Period",
    "ZoneId", "ZoneOffset", "DateTimeFormatter",
    // java.math, java.nio, java.io, java.net
    "BigDecimal", "BigInteger", "Path", "Paths", "Files", "Charset", "StandardCharsets", "File",
    "InputStream", "OutputStream", "Reader", "Writer", "IOException", "URL", "URI", "UUID",
];

/// Annotations that mark a type or method as configuration
pub const CONFIG_ANNOTATIONS: &[&str] = &[
    "Configuration",
    "SpringBootApplication",
    "EnableAutoConfiguration",
    "EnableConfigurationProperties",
    "ComponentScan",
    "Import",
    "ImportResource",
    "Bean",
    "WebFilter",
    "WebListener",
    "ControllerAdvice",
    "RestControllerAdvice",
    "Aspect",
    "Profile",
    "ConditionalOnClass",
    "ConditionalOnMissingBean",
    "ConditionalOnProperty",
    "ConditionalOnExpression",
    "ConditionalOnBean",
];

/// Supertypes whose implementors are configuration
pub const CONFIG_SUPERTYPES: &[&str] = &[
    "WebMvcConfigurer",
    "WebSecurityConfigurerAdapter",
    "SecurityConfigurerAdapter",
    "WebFluxConfigurer",
    "ReactiveWebServerFactoryCustomizer",
    "WebServerFactoryCustomizer",
    "ApplicationContextInitializer",
    "ApplicationListener",
    "ApplicationRunner",
    "CommandLineRunner",
    "EnvironmentPostProcessor",
    "BeanPostProcessor",
    "BeanFactoryPostProcessor",
    "InitializingBean",
    "DisposableBean",
    "HandlerInterceptor",
    "HandlerMethodArgumentResolver",
    "HandlerMethodReturnValueHandler",
    "Filter",
    "ServletContextListener",
    "AuthenticationProvider",
    "UserDetailsService",
    "PasswordEncoder",
    "MethodInterceptor",
    "Advisor",
    "Pointcut",
];

/// Spring MVC mapping annotations and the verb they imply
pub const SPRING_MAPPINGS: &[(&str, &str)] = &[
    ("GetMapping", "GET"),
    ("PostMapping", "POST"),
    ("PutMapping", "PUT"),
    ("DeleteMapping", "DELETE"),
    ("PatchMapping", "PATCH"),
    ("RequestMapping", "REQUEST"),
];

/// JAX-RS verb annotations
pub const JAX_RS_METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"];

pub fn is_builtin_type(simple_name: &str) -> bool {
    BUILTIN_TYPES.contains(&simple_name)
}

pub fn is_builtin_package(qualified_name: &str) -> bool {
    BUILTIN_PACKAGES.iter().any(|pkg| {
        if pkg.ends_with('.') {
            qualified_name.starts_with(pkg)
        } else {
            qualified_name == *pkg
                || qualified_name
                    .strip_prefix(pkg)
                    .is_some_and(|rest| rest.starts_with('.'))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_packages_match_on_segment_boundaries() {
        assert!(is_builtin_package("java.util.List"));
        assert!(is_builtin_package("org.springframework.web.bind.annotation.GetMapping"));
        assert!(!is_builtin_package("org.springframeworkish.Thing"));
        assert!(!is_builtin_package("com.acme.orders.Order"));
    }

    #[test]
    fn primitives_and_wrappers_are_builtin() {
        assert!(is_builtin_type("int"));
        assert!(is_builtin_type("String"));
        assert!(!is_builtin_type("OrderService"));
    }
}
